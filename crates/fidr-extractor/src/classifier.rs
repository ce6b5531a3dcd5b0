//! Document classifier
//!
//! Scores a document against an ordered table of type rules (header patterns,
//! weight, required sections) and picks the best match deterministically.
//! Classification never fails; a document matching nothing is simply
//! `Unknown` with confidence 0.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use fidr_core::{ClassifierConfig, DocumentType};
use fidr_ontology::OntologySchema;

/// Result of classifying one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub document_type: DocumentType,
    pub ontology_class: String,
    pub confidence: f32,
    pub matched_patterns: Vec<String>,
    pub sections_detected: Vec<String>,
}

/// Company header fields pulled from a filing front page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyHeader {
    pub company_name: Option<String>,
    pub ticker: Option<String>,
    pub cik: Option<String>,
}

struct ClassifierRule {
    document_type: DocumentType,
    patterns: Vec<Regex>,
    weight: f32,
    required_sections: Vec<&'static str>,
    ontology_class: String,
}

/// Pattern-based document classifier
pub struct DocumentClassifier {
    config: ClassifierConfig,
    rules: Vec<ClassifierRule>,
    section_patterns: Vec<(&'static str, Vec<Regex>)>,
    date_patterns: Vec<Regex>,
    header_name: Option<Regex>,
    header_ticker: Option<Regex>,
    header_cik: Option<Regex>,
    unknown_class: String,
}

impl DocumentClassifier {
    /// Build the classifier with its full rule table
    pub fn new(config: ClassifierConfig, schema: &OntologySchema) -> Self {
        let mut classifier = Self {
            config,
            rules: Vec::new(),
            section_patterns: Vec::new(),
            date_patterns: Vec::new(),
            header_name: None,
            header_ticker: None,
            header_cik: None,
            unknown_class: schema
                .map_document_type(DocumentType::Unknown)
                .unwrap_or_default()
                .to_string(),
        };

        classifier.init_rules(schema);
        classifier.init_section_patterns();
        classifier.init_header_patterns();
        classifier
    }

    fn init_rules(&mut self, schema: &OntologySchema) {
        // Declaration order is the tie-break order.
        self.add_rule(
            schema,
            DocumentType::Form10K,
            &[
                r"FORM\s+10-K",
                r"ANNUAL\s+REPORT\s+PURSUANT\s+TO\s+SECTION\s+13",
            ],
            1.0,
            vec!["item_1", "item_1a", "item_7", "item_8"],
        );
        self.add_rule(
            schema,
            DocumentType::Form10Q,
            &[
                r"FORM\s+10-Q",
                r"QUARTERLY\s+REPORT\s+PURSUANT\s+TO\s+SECTION\s+13",
            ],
            1.0,
            vec!["item_1", "item_2"],
        );
        self.add_rule(
            schema,
            DocumentType::Form8K,
            &[
                r"FORM\s+8-K",
                r"CURRENT\s+REPORT\s+PURSUANT\s+TO\s+SECTION\s+13",
            ],
            1.0,
            vec![],
        );
        self.add_rule(
            schema,
            DocumentType::ProxyStatement,
            &[
                r"PROXY\s+STATEMENT",
                r"DEF\s*14A",
                r"SCHEDULE\s+14A",
                r"NOTICE\s+OF\s+ANNUAL\s+MEETING",
            ],
            1.0,
            vec![],
        );
        self.add_rule(
            schema,
            DocumentType::EquityResearch,
            &[
                r"(?:BUY|SELL|HOLD|NEUTRAL|OUTPERFORM|UNDERPERFORM)\s+(?:RATING|RECOMMENDATION)",
                r"PRICE\s+TARGET",
                r"INVESTMENT\s+THESIS",
                r"DCF\s+(?:ANALYSIS|VALUATION)",
                r"(?:COMPARABLE|COMPS)\s+ANALYSIS",
                r"(?:TARGET|FAIR)\s+VALUE",
            ],
            0.8,
            vec![],
        );
        self.add_rule(
            schema,
            DocumentType::EarningsCall,
            &[
                r"EARNINGS\s+(?:CALL|CONFERENCE)",
                r"(?:Q[1-4]|FOURTH|FIRST|SECOND|THIRD)\s+(?:QUARTER|FISCAL)\s+\d{4}\s+(?:EARNINGS|RESULTS)",
                r"OPERATOR:.*(?:WELCOME|THANK\s+YOU\s+FOR\s+STANDING\s+BY)",
                r"QUESTION-?AND-?ANSWER\s+SESSION",
                r"(?:PREPARED\s+REMARKS|OPENING\s+REMARKS)",
            ],
            0.8,
            vec![],
        );
        self.add_rule(
            schema,
            DocumentType::PressRelease,
            &[
                r"PRESS\s+RELEASE",
                r"FOR\s+IMMEDIATE\s+RELEASE",
                r"(?:REPORTS|ANNOUNCES)\s+(?:Q[1-4]|QUARTERLY|ANNUAL)\s+(?:RESULTS|EARNINGS)",
                r"CONTACT:.*(?:INVESTOR\s+RELATIONS|MEDIA\s+RELATIONS)",
            ],
            0.7,
            vec![],
        );
        self.add_rule(
            schema,
            DocumentType::EconomicData,
            &[
                r"FRED\s+(?:ECONOMIC|DATA)\s+SERIES",
                r"(?:GDP|UNEMPLOYMENT|INFLATION|CPI|INTEREST\s+RATE)\s+(?:DATA|SERIES)",
                r"FEDERAL\s+RESERVE",
                r"MACROECONOMIC\s+(?:DATA|INDICATOR)",
            ],
            0.9,
            vec![],
        );
        self.add_rule(
            schema,
            DocumentType::NewsArticle,
            &[
                r"(?:REUTERS|ASSOCIATED\s+PRESS|BLOOMBERG)\s*[-\u{2014}]",
                r"(?:BREAKING|EXCLUSIVE):",
            ],
            0.6,
            vec![],
        );
    }

    fn init_section_patterns(&mut self) {
        let table: [(&'static str, &[&str]); 12] = [
            ("item_1", &[r"ITEM\s*1[.\s]*[-\u{2013}\u{2014}]?\s*BUSINESS", r"PART\s*I.*ITEM\s*1\b"]),
            ("item_1a", &[r"ITEM\s*1A[.\s]*[-\u{2013}\u{2014}]?\s*RISK\s*FACTORS"]),
            ("item_1b", &[r"ITEM\s*1B[.\s]*[-\u{2013}\u{2014}]?\s*UNRESOLVED\s*STAFF\s*COMMENTS"]),
            (
                "item_2",
                &[r"ITEM\s*2[.\s]*[-\u{2013}\u{2014}]?\s*(?:PROPERTIES|MANAGEMENT['\u{2019}]?S\s*DISCUSSION)"],
            ),
            ("item_3", &[r"ITEM\s*3[.\s]*[-\u{2013}\u{2014}]?\s*LEGAL\s*PROCEEDINGS"]),
            ("item_4", &[r"ITEM\s*4[.\s]*[-\u{2013}\u{2014}]?\s*MINE\s*SAFETY"]),
            ("item_5", &[r"ITEM\s*5[.\s]*[-\u{2013}\u{2014}]?\s*MARKET\s*FOR"]),
            ("item_6", &[r"ITEM\s*6[.\s]*[-\u{2013}\u{2014}]?\s*(?:RESERVED|SELECTED\s*FINANCIAL)"]),
            ("item_7", &[r"ITEM\s*7[.\s]*[-\u{2013}\u{2014}]?\s*MANAGEMENT['\u{2019}]?S\s*DISCUSSION"]),
            ("item_7a", &[r"ITEM\s*7A[.\s]*[-\u{2013}\u{2014}]?\s*QUANTITATIVE\s*AND\s*QUALITATIVE"]),
            ("item_8", &[r"ITEM\s*8[.\s]*[-\u{2013}\u{2014}]?\s*FINANCIAL\s*STATEMENTS"]),
            ("item_9", &[r"ITEM\s*9[.\s]*[-\u{2013}\u{2014}]?\s*CHANGES\s*IN\s*AND\s*DISAGREEMENTS"]),
        ];

        for (section, patterns) in table {
            let compiled: Vec<Regex> = patterns.iter().filter_map(|p| compile_ci(p)).collect();
            self.section_patterns.push((section, compiled));
        }
    }

    fn init_header_patterns(&mut self) {
        let date_patterns = [
            r"(?:For\s+the\s+(?:fiscal\s+)?year\s+ended|Period\s+ended)\s+(\w+\s+\d{1,2},?\s+\d{4})",
            r"(?:Filed|Filing\s+Date)[:\s]+(\w+\s+\d{1,2},?\s+\d{4})",
            r"(?:Date\s+of\s+Report)[:\s]+(\w+\s+\d{1,2},?\s+\d{4})",
        ];
        self.date_patterns = date_patterns.iter().filter_map(|p| compile_ci(p)).collect();

        self.header_name = compile_ci(
            r"(?:REGISTRANT|COMPANY|ISSUER)[:\s]+([A-Z][A-Za-z\s,.]+(?:INC\.|CORP\.|LLC|LTD\.))",
        );
        self.header_ticker = compile_ci(r"(?:TICKER|TRADING)\s*(?:SYMBOL)?[:\s]+([A-Z]{1,5})\b");
        self.header_cik = compile_ci(r"(?:CIK|COMMISSION\s+FILE\s+NUMBER)[:\s#]+(\d{10}|\d+-\d+-\d+)");
    }

    fn add_rule(
        &mut self,
        schema: &OntologySchema,
        document_type: DocumentType,
        patterns: &[&str],
        weight: f32,
        required_sections: Vec<&'static str>,
    ) {
        let compiled: Vec<Regex> = patterns.iter().filter_map(|p| compile_ci(p)).collect();
        let ontology_class = schema
            .map_document_type(document_type)
            .unwrap_or(&self.unknown_class)
            .to_string();

        self.rules.push(ClassifierRule {
            document_type,
            patterns: compiled,
            weight,
            required_sections,
            ontology_class,
        });
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    /// Classify a document by its content
    pub fn classify(&self, text: &str) -> Classification {
        let head = truncate_at_boundary(text, self.config.scan_limit);
        let sections_detected = self.detect_sections(text);

        let mut best: Option<(&ClassifierRule, f32, Vec<String>)> = None;

        for rule in &self.rules {
            let matched: Vec<String> = rule
                .patterns
                .iter()
                .filter(|p| p.is_match(head))
                .map(|p| p.as_str().to_string())
                .collect();
            if matched.is_empty() {
                continue;
            }

            let mut score = (matched.len() as f32 / rule.patterns.len() as f32) * rule.weight;

            if !rule.required_sections.is_empty() {
                let overlap = rule
                    .required_sections
                    .iter()
                    .filter(|s| sections_detected.iter().any(|d| d == *s))
                    .count() as f32
                    / rule.required_sections.len() as f32;
                score += overlap * 0.3;
            }

            let score = score.clamp(0.0, 1.0);

            // Strictly greater: ties resolve to the earlier-declared type.
            if best.as_ref().map_or(true, |(_, s, _)| score > *s) {
                best = Some((rule, score, matched));
            }
        }

        match best {
            Some((rule, score, matched)) if score >= self.config.confidence_threshold => {
                debug!(
                    document_type = %rule.document_type,
                    confidence = score,
                    "document classified"
                );
                Classification {
                    document_type: rule.document_type,
                    ontology_class: rule.ontology_class.clone(),
                    confidence: score,
                    matched_patterns: matched,
                    sections_detected,
                }
            }
            _ => Classification {
                document_type: DocumentType::Unknown,
                ontology_class: self.unknown_class.clone(),
                confidence: 0.0,
                matched_patterns: Vec::new(),
                sections_detected,
            },
        }
    }

    /// Classify a batch of documents
    pub fn classify_batch(&self, documents: &[&str]) -> Vec<Classification> {
        documents.iter().map(|text| self.classify(text)).collect()
    }

    /// Detect filing sections in the document head
    pub fn detect_sections(&self, text: &str) -> Vec<String> {
        let head = truncate_at_boundary(text, self.config.section_scan_limit);
        let mut sections = Vec::new();

        for (section, patterns) in &self.section_patterns {
            if patterns.iter().any(|p| p.is_match(head)) {
                sections.push(section.to_string());
            }
        }

        sections
    }

    /// Pull the filing date out of a document header, if present
    pub fn extract_document_date(&self, text: &str) -> Option<String> {
        let head = truncate_at_boundary(text, 5000);
        for pattern in &self.date_patterns {
            if let Some(caps) = pattern.captures(head) {
                if let Some(m) = caps.get(1) {
                    return Some(m.as_str().to_string());
                }
            }
        }
        None
    }

    /// Pull registrant name, ticker, and CIK out of a filing header
    pub fn extract_company_info(&self, text: &str) -> CompanyHeader {
        let head = truncate_at_boundary(text, 5000);
        let mut info = CompanyHeader::default();

        if let Some(re) = &self.header_name {
            if let Some(caps) = re.captures(head) {
                info.company_name = caps.get(1).map(|m| m.as_str().trim().to_string());
            }
        }
        if let Some(re) = &self.header_ticker {
            if let Some(caps) = re.captures(head) {
                info.ticker = caps.get(1).map(|m| m.as_str().to_string());
            }
        }
        if let Some(re) = &self.header_cik {
            if let Some(caps) = re.captures(head) {
                info.cik = caps.get(1).map(|m| m.as_str().replace('-', ""));
            }
        }

        info
    }
}

fn compile_ci(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .ok()
}

/// Cut `text` to at most `limit` bytes without splitting a character
fn truncate_at_boundary(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> DocumentClassifier {
        DocumentClassifier::new(ClassifierConfig::default(), &OntologySchema::new())
    }

    #[test]
    fn test_classifies_10k_header() {
        let c = classifier();
        let result = c.classify("FORM 10-K Annual Report pursuant to Section 13");
        assert_eq!(result.document_type, DocumentType::Form10K);
        assert!(result.confidence >= 0.8, "confidence {}", result.confidence);
    }

    #[test]
    fn test_classifies_10q() {
        let c = classifier();
        let result = c.classify("FORM 10-Q\nQuarterly report pursuant to Section 13 or 15(d)");
        assert_eq!(result.document_type, DocumentType::Form10Q);
    }

    #[test]
    fn test_unmatched_text_is_unknown() {
        let c = classifier();
        let result = c.classify("a grocery list: eggs, milk, bread");
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert!(result.matched_patterns.is_empty());
    }

    #[test]
    fn test_weak_single_match_falls_below_threshold() {
        let c = classifier();
        // One of four press-release patterns at weight 0.7 scores 0.175.
        let result = c.classify("PRESS RELEASE");
        assert_eq!(result.document_type, DocumentType::Unknown);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        let text = "FORM 10-K Annual Report pursuant to Section 13\nITEM 1. BUSINESS\nITEM 1A. RISK FACTORS";
        let first = c.classify(text);
        for _ in 0..5 {
            let again = c.classify(text);
            assert_eq!(again.document_type, first.document_type);
            assert_eq!(again.confidence, first.confidence);
        }
    }

    #[test]
    fn test_section_boost() {
        let c = classifier();
        let plain = c.classify("FORM 10-K");
        let with_sections = c.classify(
            "FORM 10-K\nITEM 1. BUSINESS\nITEM 1A. RISK FACTORS\nITEM 7. MANAGEMENT'S DISCUSSION\nITEM 8. FINANCIAL STATEMENTS",
        );
        assert!(with_sections.confidence > plain.confidence);
        assert_eq!(with_sections.sections_detected.len(), 4);
    }

    #[test]
    fn test_confidence_never_exceeds_one() {
        let c = classifier();
        let result = c.classify(
            "FORM 10-K Annual Report pursuant to Section 13\nITEM 1. BUSINESS\nITEM 1A. RISK FACTORS\nITEM 7. MANAGEMENT'S DISCUSSION\nITEM 8. FINANCIAL STATEMENTS",
        );
        assert_eq!(result.document_type, DocumentType::Form10K);
        assert!(result.confidence <= 1.0);
    }

    #[test]
    fn test_extract_document_date() {
        let c = classifier();
        let date = c.extract_document_date("For the fiscal year ended September 28, 2024");
        assert_eq!(date.as_deref(), Some("September 28, 2024"));
        assert!(c.extract_document_date("no date here").is_none());
    }

    #[test]
    fn test_extract_company_info() {
        let c = classifier();
        let info = c.extract_company_info(
            "REGISTRANT: Apple Inc.\nTRADING SYMBOL: AAPL\nCOMMISSION FILE NUMBER: 001-36743",
        );
        assert_eq!(info.ticker.as_deref(), Some("AAPL"));
        assert!(info.cik.is_some());
    }
}
