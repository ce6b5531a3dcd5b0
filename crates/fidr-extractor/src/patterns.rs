//! Entity pattern tables
//!
//! Data-driven regex rule tables for every extractable entity type, plus the
//! company alias table, the lexicon of known surface forms, and the
//! section -> allowed-entity-types table for SEC filings. Everything is
//! compiled once at construction and shared read-only.

use std::collections::HashMap;

use regex::Regex;

use fidr_core::EntityType;

/// A single extraction rule: pattern plus base confidence
#[derive(Debug)]
pub struct EntityRule {
    pub regex: Regex,
    pub confidence: f32,
}

/// A known surface form recognized by the lexicon recognizer
#[derive(Debug, Clone)]
pub struct LexiconEntry {
    pub term: String,
    pub entity_type: EntityType,
    pub confidence: f32,
}

/// Compiled entity pattern tables
///
/// Rules are kept per entity type in declaration order so extraction stays
/// deterministic across runs.
pub struct EntityPatternSet {
    rules: Vec<(EntityType, Vec<EntityRule>)>,
    aliases: HashMap<String, String>,
    lexicon: Vec<LexiconEntry>,
    section_types: HashMap<&'static str, Vec<EntityType>>,
}

impl EntityPatternSet {
    /// Build the full financial-domain pattern set
    pub fn new() -> Self {
        let mut set = Self {
            rules: Vec::new(),
            aliases: HashMap::new(),
            lexicon: Vec::new(),
            section_types: HashMap::new(),
        };

        set.init_company_patterns();
        set.init_person_patterns();
        set.init_product_patterns();
        set.init_metric_patterns();
        set.init_risk_patterns();
        set.init_value_patterns();
        set.init_aliases();
        set.init_lexicon();
        set.init_section_types();
        set
    }

    // ------------------------------------------------------------------
    // Pattern tables
    // ------------------------------------------------------------------

    fn init_company_patterns(&mut self) {
        // Well-known issuers, longest surface form first so the full name
        // wins the alternation.
        self.add_pattern(
            EntityType::Company,
            r"(Apple\s+Inc\.?|Microsoft\s+Corporation|Microsoft\s+Corp\.?|Alphabet\s+Inc\.?|Amazon\.com,?\s+Inc\.?|Meta\s+Platforms,?\s+Inc\.?|NVIDIA\s+Corporation|Tesla,?\s+Inc\.?|Intel\s+Corporation|Oracle\s+Corporation|Cisco\s+Systems,?\s+Inc\.?|Adobe\s+Inc\.?)",
            0.95,
        );
        self.add_pattern(
            EntityType::Company,
            r"\b(Apple|Google|Alphabet|Microsoft|Amazon|Meta|Facebook|Tesla|NVIDIA|AMD|Intel|IBM|Oracle|Cisco|Salesforce|Adobe)\b",
            0.95,
        );
        self.add_pattern(
            EntityType::Company,
            r"(JPMorgan\s+Chase\s+&\s+Co\.?|JPMorgan|JP\s*Morgan|Goldman\s+Sachs|Morgan\s+Stanley|Bank\s+of\s+America|Citigroup|Wells\s+Fargo|BlackRock|Visa\s+Inc\.?|Mastercard)",
            0.95,
        );
        self.add_pattern(
            EntityType::Company,
            r"(Johnson\s*&\s*Johnson|Pfizer|Merck|AbbVie|Bristol[- ]Myers\s+Squibb|Eli\s+Lilly|Amgen|UnitedHealth)",
            0.95,
        );
        self.add_pattern(
            EntityType::Company,
            r"(Walmart|Target\s+Corporation|Costco|Home\s+Depot|Coca[- ]Cola|PepsiCo|Procter\s*&\s*Gamble)",
            0.95,
        );
        self.add_pattern(
            EntityType::Company,
            r"(Exxon\s+Mobil\s+Corporation|ExxonMobil|Chevron|ConocoPhillips|Shell|Boeing|Caterpillar|Lockheed\s+Martin|Honeywell)",
            0.95,
        );
        // Generic "Name Suffix" form. No trailing word boundary so the
        // abbreviation period stays inside the span.
        self.add_pattern(
            EntityType::Company,
            r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\s+(?:Inc\.|Inc\b|Corp\.|Corp\b|Corporation\b|Company\b|Co\.|Ltd\.|Ltd\b|LLC\b|L\.P\.|LP\b|PLC\b))",
            0.9,
        );
    }

    fn init_person_patterns(&mut self) {
        self.add_pattern(
            EntityType::Person,
            r"(?:CEO|CFO|CTO|COO|Chairman|President|Director|Chief\s+Executive\s+Officer|Chief\s+Financial\s+Officer)\s+([A-Z][a-z]+\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\b",
            0.85,
        );
        self.add_pattern(
            EntityType::Person,
            r"\b([A-Z][a-z]+\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?),?\s+(?:the\s+)?(?:CEO|CFO|CTO|COO|Chairman|President|Director)\b",
            0.85,
        );
        self.add_pattern(
            EntityType::Person,
            r"\b(Tim\s+Cook|Satya\s+Nadella|Sundar\s+Pichai|Andy\s+Jassy|Mark\s+Zuckerberg|Jensen\s+Huang|Elon\s+Musk|Jamie\s+Dimon)\b",
            0.95,
        );
    }

    fn init_product_patterns(&mut self) {
        self.add_pattern(
            EntityType::Product,
            r"\b(iPhone|iPad|MacBook|Mac|Apple\s+Watch|AirPods|Vision\s+Pro|App\s+Store|iCloud)\b",
            0.9,
        );
        self.add_pattern(
            EntityType::Product,
            r"\b(Windows|Azure|Office\s+365|Microsoft\s+365|Xbox|Surface|LinkedIn|GitHub)\b",
            0.9,
        );
        self.add_pattern(
            EntityType::Product,
            r"\b(Android|Chrome|Gmail|YouTube|Google\s+Cloud|Google\s+Search|Pixel|Waymo)\b",
            0.9,
        );
        self.add_pattern(
            EntityType::Product,
            r"\b(AWS|Amazon\s+Web\s+Services|Prime|Alexa|Kindle|Echo)\b",
            0.9,
        );
    }

    fn init_metric_patterns(&mut self) {
        const AMOUNT: &str = r"\$?[\d,]+(?:\.\d+)?\s*(?:trillion|billion|million|thousand|[TBMK]\b)?";

        self.add_pattern(
            EntityType::Revenue,
            &format!(r"(?i)(?:total\s+)?(?:net\s+)?(?:revenue|sales)\s+(?:of\s+)?({AMOUNT})"),
            0.9,
        );
        self.add_pattern(
            EntityType::Revenue,
            &format!(r"(?i)({AMOUNT})\s+(?:in\s+)?(?:total\s+)?(?:net\s+)?(?:revenue|sales)"),
            0.9,
        );
        self.add_pattern(
            EntityType::Revenue,
            &format!(
                r"(?i)(?:revenue|sales)\s+(?:increased|decreased|grew|declined)\s+(?:by\s+)?({AMOUNT})"
            ),
            0.85,
        );

        self.add_pattern(
            EntityType::NetIncome,
            &format!(r"(?i)(?:net\s+)?(?:income|earnings|profit)\s+(?:of\s+|was\s+)?({AMOUNT})"),
            0.9,
        );
        self.add_pattern(
            EntityType::NetIncome,
            &format!(r"(?i)({AMOUNT})\s+(?:in\s+)?(?:net\s+)?(?:income|earnings|profit)"),
            0.9,
        );

        self.add_pattern(
            EntityType::EarningsPerShare,
            r"(?i)(?:EPS|earnings\s+per\s+share)\s+(?:of\s+|was\s+)?(\$?\d+(?:\.\d+)?)",
            0.9,
        );
        self.add_pattern(
            EntityType::EarningsPerShare,
            r"(?i)(\$?\d+\.\d+)\s+(?:per\s+(?:diluted\s+)?share|diluted\s+EPS|EPS)",
            0.85,
        );

        self.add_pattern(
            EntityType::TotalAssets,
            &format!(r"(?i)total\s+assets\s+(?:of\s+|exceeded\s+|reached\s+)?({AMOUNT})"),
            0.9,
        );
        self.add_pattern(
            EntityType::TotalAssets,
            &format!(r"(?i)({AMOUNT})\s+(?:in\s+)?total\s+assets"),
            0.9,
        );

        self.add_pattern(
            EntityType::CashFlow,
            &format!(r"(?i)(?:operating\s+)?cash\s+flow\s+(?:of\s+|was\s+|reached\s+)?({AMOUNT})"),
            0.85,
        );
        self.add_pattern(
            EntityType::CashFlow,
            &format!(r"(?i)free\s+cash\s+flow\s+(?:of\s+)?({AMOUNT})"),
            0.85,
        );

        self.add_pattern(
            EntityType::MonetaryAmount,
            r"(?i)(\$\s*[\d,]+(?:\.\d+)?(?:\s*(?:trillion|billion|million|thousand|[TBMK])\b)?)",
            0.9,
        );
        self.add_pattern(
            EntityType::MonetaryAmount,
            r"(?i)([\d,]+(?:\.\d+)?\s*(?:trillion|billion|million|thousand))\s+(?:dollars|USD)",
            0.85,
        );
    }

    fn init_risk_patterns(&mut self) {
        self.add_pattern(
            EntityType::SupplyChainRisk,
            r"(?i)supply\s+chain\s+(?:risks?|disruptions?|challenges?|issues?|concentration)",
            0.85,
        );
        self.add_pattern(
            EntityType::SupplyChainRisk,
            r"(?i)(?:manufacturing|production|logistics|distribution)\s+(?:risks?|disruptions?|challenges?)",
            0.8,
        );
        self.add_pattern(
            EntityType::SupplyChainRisk,
            r"(?i)(?:supplier|vendor)\s+(?:concentration|dependenc[ey]|risks?|disruptions?)",
            0.8,
        );
        self.add_pattern(
            EntityType::SupplyChainRisk,
            r"(?i)(?:single|sole|limited)\s+source\s+(?:supplier|manufacturing)",
            0.85,
        );

        self.add_pattern(
            EntityType::CurrencyRisk,
            r"(?i)(?:foreign\s+)?(?:currency|exchange\s+rate|fx)\s+(?:risks?|exposure|fluctuations?|volatility)",
            0.85,
        );
        self.add_pattern(
            EntityType::CurrencyRisk,
            r"(?i)(?:foreign\s+exchange|currency)\s+(?:hedging|exposure|translation)",
            0.8,
        );

        self.add_pattern(
            EntityType::RegulatoryRisk,
            r"(?i)regulatory\s+(?:risks?|compliance|changes?|uncertainty|environment|requirements?)",
            0.85,
        );
        self.add_pattern(
            EntityType::RegulatoryRisk,
            r"(?i)(?:government|legal|legislative)\s+(?:risks?|actions?|changes?|regulations?)",
            0.8,
        );
        self.add_pattern(
            EntityType::RegulatoryRisk,
            r"(?i)(?:antitrust|data\s+privacy|environmental)\s+(?:regulations?|compliance|laws?)",
            0.85,
        );

        self.add_pattern(
            EntityType::GeopoliticalRisk,
            r"(?i)geopolitical\s+(?:risks?|tensions?|uncertainty|events?|instability)",
            0.85,
        );
        self.add_pattern(
            EntityType::GeopoliticalRisk,
            r"(?i)(?:trade\s+war|tariffs?|sanctions?|embargo|trade\s+restrictions?)",
            0.85,
        );

        self.add_pattern(
            EntityType::CompetitiveRisk,
            r"(?i)competit(?:ive|ion)\s+(?:risks?|pressures?|threats?|landscape|environment)",
            0.85,
        );
        self.add_pattern(
            EntityType::CompetitiveRisk,
            r"(?i)(?:intense|increasing|significant)\s+competition",
            0.8,
        );
        self.add_pattern(
            EntityType::CompetitiveRisk,
            r"(?i)market\s+(?:share|position)\s+(?:loss|decline|pressure)",
            0.8,
        );

        self.add_pattern(
            EntityType::CybersecurityRisk,
            r"(?i)(?:cyber(?:security)?|information\s+security|data\s+security)\s+(?:risks?|threats?|breach(?:es)?|incidents?)",
            0.85,
        );
        self.add_pattern(EntityType::CybersecurityRisk, r"(?i)(?:data|security)\s+breach(?:es)?", 0.85);
        self.add_pattern(
            EntityType::CybersecurityRisk,
            r"(?i)(?:ransomware|malware|phishing|hacking)\s+(?:attacks?|threats?|risks?)",
            0.85,
        );

        self.add_pattern(
            EntityType::TechnologyRisk,
            r"(?i)technolog(?:y|ical)\s+(?:risks?|changes?|disruptions?|obsolescence)",
            0.85,
        );
        self.add_pattern(
            EntityType::TechnologyRisk,
            r"(?i)(?:digital|technology)\s+transformation\s+(?:risks?|challenges?)",
            0.8,
        );
    }

    fn init_value_patterns(&mut self) {
        self.add_pattern(
            EntityType::Date,
            r"(?i)\b((?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4})\b",
            0.95,
        );
        self.add_pattern(EntityType::Date, r"\b(\d{1,2}/\d{1,2}/\d{4})\b", 0.9);
        self.add_pattern(EntityType::Date, r"(?i)\b(Q[1-4]\s*\d{4}|FY\s*\d{4}|\d{4}\s*Q[1-4])\b", 0.9);
        self.add_pattern(
            EntityType::Date,
            r"(?i)(?:fiscal\s+)?(?:year|quarter)\s+(?:ended|ending)\s+(\w+\s+\d{1,2},?\s+\d{4})",
            0.9,
        );

        self.add_pattern(EntityType::Percentage, r"(\d+(?:\.\d+)?)\s*%", 0.9);
        self.add_pattern(EntityType::Percentage, r"(?i)(\d+(?:\.\d+)?)\s+percent", 0.85);
    }

    // ------------------------------------------------------------------
    // Aliases and lexicon
    // ------------------------------------------------------------------

    fn init_aliases(&mut self) {
        let aliases = [
            ("alphabet", "Alphabet Inc."),
            ("google", "Alphabet Inc."),
            ("apple", "Apple Inc."),
            ("apple inc", "Apple Inc."),
            ("apple inc.", "Apple Inc."),
            ("microsoft", "Microsoft Corporation"),
            ("microsoft corp", "Microsoft Corporation"),
            ("microsoft corp.", "Microsoft Corporation"),
            ("amazon", "Amazon.com Inc."),
            ("amazon.com inc", "Amazon.com Inc."),
            ("meta", "Meta Platforms Inc."),
            ("facebook", "Meta Platforms Inc."),
            ("tesla", "Tesla Inc."),
            ("nvidia", "NVIDIA Corporation"),
            ("jpmorgan", "JPMorgan Chase & Co."),
            ("jp morgan", "JPMorgan Chase & Co."),
            ("goldman sachs", "The Goldman Sachs Group, Inc."),
            ("johnson & johnson", "Johnson & Johnson"),
            ("j&j", "Johnson & Johnson"),
            ("coca-cola", "The Coca-Cola Company"),
            ("coke", "The Coca-Cola Company"),
            ("exxonmobil", "Exxon Mobil Corporation"),
            ("exxon mobil", "Exxon Mobil Corporation"),
        ];

        for (alias, canonical) in aliases {
            self.aliases.insert(alias.to_string(), canonical.to_string());
        }
    }

    fn init_lexicon(&mut self) {
        // Surface forms the pattern tables do not cover.
        let companies = [
            "Berkshire Hathaway",
            "Broadcom",
            "Qualcomm",
            "Netflix",
            "PayPal",
            "Uber",
            "Airbnb",
            "Palantir",
        ];
        for term in companies {
            self.add_term(term, EntityType::Company, 0.9);
        }

        let executives = ["Warren Buffett", "Larry Fink", "Lisa Su", "Pat Gelsinger"];
        for term in executives {
            self.add_term(term, EntityType::Person, 0.9);
        }

        let products = ["Gemini", "Copilot", "Instagram", "WhatsApp", "Snapdragon"];
        for term in products {
            self.add_term(term, EntityType::Product, 0.85);
        }
    }

    fn init_section_types(&mut self) {
        use EntityType::*;

        self.section_types
            .insert("item_1", vec![Company, Product, Person, Date]);
        self.section_types.insert(
            "item_1a",
            vec![
                Company,
                SupplyChainRisk,
                CurrencyRisk,
                RegulatoryRisk,
                GeopoliticalRisk,
                CompetitiveRisk,
                CybersecurityRisk,
                TechnologyRisk,
                Percentage,
            ],
        );
        self.section_types.insert(
            "item_7",
            vec![
                Company,
                Revenue,
                NetIncome,
                EarningsPerShare,
                MonetaryAmount,
                Percentage,
                Date,
            ],
        );
        self.section_types.insert(
            "item_8",
            vec![Revenue, NetIncome, TotalAssets, CashFlow, MonetaryAmount, Date],
        );
    }

    fn add_pattern(&mut self, entity_type: EntityType, pattern: &str, confidence: f32) {
        if let Ok(regex) = Regex::new(pattern) {
            let rule = EntityRule { regex, confidence };
            match self.rules.iter_mut().find(|(t, _)| *t == entity_type) {
                Some((_, rules)) => rules.push(rule),
                None => self.rules.push((entity_type, vec![rule])),
            }
        }
    }

    fn add_term(&mut self, term: &str, entity_type: EntityType, confidence: f32) {
        self.lexicon.push(LexiconEntry {
            term: term.to_string(),
            entity_type,
            confidence,
        });
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Rule tables in declaration order
    pub fn rules(&self) -> &[(EntityType, Vec<EntityRule>)] {
        &self.rules
    }

    /// Lexicon of known surface forms
    pub fn lexicon(&self) -> &[LexiconEntry] {
        &self.lexicon
    }

    /// Resolve a company surface form to its canonical name
    pub fn resolve_company_alias(&self, text: &str) -> Option<&str> {
        self.aliases
            .get(&text.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Entity types worth scanning for in a given filing section
    pub fn allowed_types_for_section(&self, section: &str) -> Option<&[EntityType]> {
        self.section_types.get(section).map(Vec::as_slice)
    }
}

impl Default for EntityPatternSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        let set = EntityPatternSet::new();
        // add_pattern drops patterns that fail to compile; every table entry
        // must survive.
        let total: usize = set.rules().iter().map(|(_, r)| r.len()).sum();
        assert!(total >= 40, "expected full rule tables, got {total}");
    }

    #[test]
    fn test_company_full_form_matches_as_one_span() {
        let set = EntityPatternSet::new();
        let (_, rules) = &set.rules()[0];
        let caps = rules[0].regex.captures("Apple Inc. reported revenue").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "Apple Inc.");
    }

    #[test]
    fn test_revenue_pattern_captures_amount_span() {
        let set = EntityPatternSet::new();
        let rules = set
            .rules()
            .iter()
            .find(|(t, _)| *t == fidr_core::EntityType::Revenue)
            .map(|(_, r)| r)
            .unwrap();
        let caps = rules[0]
            .regex
            .captures("reported revenue of $120 billion.")
            .unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "$120 billion");
    }

    #[test]
    fn test_alias_resolution() {
        let set = EntityPatternSet::new();
        assert_eq!(set.resolve_company_alias("apple"), Some("Apple Inc."));
        assert_eq!(set.resolve_company_alias("Apple Inc."), Some("Apple Inc."));
        assert_eq!(set.resolve_company_alias("Umbrella Corp"), None);
    }

    #[test]
    fn test_section_type_filter() {
        let set = EntityPatternSet::new();
        let types = set.allowed_types_for_section("item_1a").unwrap();
        assert!(types.contains(&fidr_core::EntityType::SupplyChainRisk));
        assert!(!types.contains(&fidr_core::EntityType::Revenue));
        assert!(set.allowed_types_for_section("item_99").is_none());
    }
}
