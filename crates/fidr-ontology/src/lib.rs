//! FinIDR Ontology - Financial-domain schema registry
//!
//! An immutable registry of ontology classes, properties, and the rules that
//! connect them to the extraction vocabulary:
//! - entity type -> class URI mapping
//! - relation predicate -> property URI mapping
//! - the valid (subject, predicate, object) type-pair table used to gate
//!   every relation before it reaches the graph
//! - superclass label chains for graph-node labelling
//!
//! The schema is built once by [`OntologySchema::new`] and shared by
//! reference (typically behind an `Arc`). Nothing here is mutable after
//! construction.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use fidr_core::{DocumentType, EntityType, FidrError, RelationType, Result};

// ============================================================================
// Namespaces
// ============================================================================

/// Namespace URIs for the FinIDR ontology and the standard vocabularies it
/// borrows from.
pub mod ns {
    /// Companies, people, products, and the relations between them
    pub const SEI_CO: &str = "http://www.semanticexpert.ai/ontology/company#";
    /// Financial metrics and reporting relations
    pub const SEI_FIN: &str = "http://www.semanticexpert.ai/ontology/financial#";
    /// Document and filing classes
    pub const SEI_DOC: &str = "http://www.semanticexpert.ai/ontology/document#";
    /// Risk-factor hierarchy
    pub const SEI_RISK: &str = "http://www.semanticexpert.ai/ontology/risk#";
    /// Macroeconomic indicators
    pub const SEI_ECON: &str = "http://www.semanticexpert.ai/ontology/economic#";
    /// Node instances exported to RDF
    pub const FIDR_DATA: &str = "http://www.semanticexpert.ai/data#";
    /// XML Schema datatypes
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    /// RDF Schema
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
}

/// Prefix -> namespace bindings, in the order exporters should declare them.
pub const PREFIX_BINDINGS: [(&str, &str); 8] = [
    ("sei-co", ns::SEI_CO),
    ("sei-fin", ns::SEI_FIN),
    ("sei-doc", ns::SEI_DOC),
    ("sei-risk", ns::SEI_RISK),
    ("sei-econ", ns::SEI_ECON),
    ("fidr", ns::FIDR_DATA),
    ("xsd", ns::XSD),
    ("rdfs", ns::RDFS),
];

// ============================================================================
// Schema Model
// ============================================================================

/// A class in the ontology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyClass {
    /// Full class URI
    pub uri: String,

    /// Human-readable label
    pub label: String,

    /// URI of the direct superclass, if any
    pub parent: Option<String>,

    /// Alternative surface forms that resolve to this class
    pub aliases: Vec<String>,

    /// Short description
    pub description: String,
}

/// An object property in the ontology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyProperty {
    /// Full property URI
    pub uri: String,

    /// Human-readable label
    pub label: String,

    /// URI of the domain class
    pub domain: String,

    /// URI of the range class
    pub range: String,
}

/// Immutable ontology registry
///
/// Abstract pairs such as (Company, FACES_RISK, Risk) are expanded to every
/// concrete risk type at construction, so [`OntologySchema::validate_relation`]
/// is a single set lookup.
pub struct OntologySchema {
    classes: HashMap<String, OntologyClass>,
    alias_index: HashMap<String, String>,
    entity_classes: HashMap<EntityType, String>,
    document_classes: HashMap<DocumentType, String>,
    properties: HashMap<RelationType, OntologyProperty>,
    valid_pairs: HashSet<(EntityType, RelationType, EntityType)>,
    ancestors: HashMap<EntityType, Vec<&'static str>>,
}

impl Default for OntologySchema {
    fn default() -> Self {
        Self::new()
    }
}

impl OntologySchema {
    /// Build the full registry
    pub fn new() -> Self {
        let mut schema = Self {
            classes: HashMap::new(),
            alias_index: HashMap::new(),
            entity_classes: HashMap::new(),
            document_classes: HashMap::new(),
            properties: HashMap::new(),
            valid_pairs: HashSet::new(),
            ancestors: HashMap::new(),
        };

        schema.register_classes();
        schema.register_entity_mappings();
        schema.register_document_mappings();
        schema.register_properties();
        schema.register_valid_pairs();
        schema.register_ancestors();
        schema
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    fn add_class(
        &mut self,
        namespace: &str,
        name: &str,
        parent: Option<(&str, &str)>,
        aliases: &[&str],
        description: &str,
    ) {
        let uri = format!("{namespace}{name}");
        for alias in aliases {
            self.alias_index.insert(alias.to_lowercase(), uri.clone());
        }
        self.classes.insert(
            uri.clone(),
            OntologyClass {
                uri,
                label: name.to_string(),
                parent: parent.map(|(ns, n)| format!("{ns}{n}")),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
                description: description.to_string(),
            },
        );
    }

    fn register_classes(&mut self) {
        use ns::*;

        // Company namespace
        self.add_class(SEI_CO, "Organization", None, &["organization"], "Any organized body");
        self.add_class(
            SEI_CO,
            "Company",
            Some((SEI_CO, "Organization")),
            &["company", "corporation", "firm"],
            "A commercial business entity",
        );
        self.add_class(
            SEI_CO,
            "PublicCompany",
            Some((SEI_CO, "Company")),
            &["public company", "listed company"],
            "A company with publicly traded shares",
        );
        self.add_class(
            SEI_CO,
            "PrivateCompany",
            Some((SEI_CO, "Company")),
            &["private company"],
            "A privately held company",
        );
        self.add_class(SEI_CO, "Person", None, &["person", "individual"], "A natural person");
        self.add_class(
            SEI_CO,
            "Executive",
            Some((SEI_CO, "Person")),
            &["executive", "officer"],
            "A company officer",
        );
        self.add_class(SEI_CO, "Product", None, &["product", "offering"], "A product or service");

        // Financial namespace
        self.add_class(
            SEI_FIN,
            "FinancialMetric",
            None,
            &["financial metric", "metric"],
            "A quantitative financial measure",
        );
        self.add_class(
            SEI_FIN,
            "Revenue",
            Some((SEI_FIN, "FinancialMetric")),
            &["revenue", "net sales", "total revenue"],
            "Income from normal business operations",
        );
        self.add_class(
            SEI_FIN,
            "NetIncome",
            Some((SEI_FIN, "FinancialMetric")),
            &["net income", "net earnings", "profit"],
            "Earnings after all expenses and taxes",
        );
        self.add_class(
            SEI_FIN,
            "EarningsPerShare",
            Some((SEI_FIN, "FinancialMetric")),
            &["earnings per share", "eps"],
            "Net income per outstanding share",
        );
        self.add_class(
            SEI_FIN,
            "TotalAssets",
            Some((SEI_FIN, "FinancialMetric")),
            &["total assets"],
            "Sum of all assets on the balance sheet",
        );
        self.add_class(
            SEI_FIN,
            "CashFlow",
            Some((SEI_FIN, "FinancialMetric")),
            &["cash flow", "operating cash flow", "free cash flow"],
            "Cash generated or consumed",
        );
        self.add_class(
            SEI_FIN,
            "MonetaryAmount",
            Some((SEI_FIN, "FinancialMetric")),
            &["monetary amount", "amount"],
            "A monetary value without a named metric",
        );
        self.add_class(SEI_FIN, "Percentage", None, &["percentage", "percent"], "A percentage value");

        // Document namespace
        self.add_class(SEI_DOC, "Document", None, &["document"], "Any source document");
        self.add_class(
            SEI_DOC,
            "SECFiling",
            Some((SEI_DOC, "Document")),
            &["sec filing", "filing"],
            "A filing with the SEC",
        );
        self.add_class(
            SEI_DOC,
            "Form10K",
            Some((SEI_DOC, "SECFiling")),
            &["10-k", "annual report"],
            "Annual report on Form 10-K",
        );
        self.add_class(
            SEI_DOC,
            "Form10Q",
            Some((SEI_DOC, "SECFiling")),
            &["10-q", "quarterly report"],
            "Quarterly report on Form 10-Q",
        );
        self.add_class(
            SEI_DOC,
            "Form8K",
            Some((SEI_DOC, "SECFiling")),
            &["8-k", "current report"],
            "Current report on Form 8-K",
        );
        self.add_class(
            SEI_DOC,
            "ProxyStatement",
            Some((SEI_DOC, "SECFiling")),
            &["proxy statement", "def 14a"],
            "Definitive proxy statement",
        );
        self.add_class(
            SEI_DOC,
            "EquityResearch",
            Some((SEI_DOC, "Document")),
            &["equity research", "analyst report"],
            "Sell-side or buy-side research report",
        );
        self.add_class(
            SEI_DOC,
            "EarningsCallTranscript",
            Some((SEI_DOC, "Document")),
            &["earnings call", "earnings call transcript"],
            "Transcript of an earnings conference call",
        );
        self.add_class(
            SEI_DOC,
            "PressRelease",
            Some((SEI_DOC, "Document")),
            &["press release"],
            "A company press release",
        );
        self.add_class(
            SEI_DOC,
            "EconomicDataRelease",
            Some((SEI_DOC, "Document")),
            &["economic data", "economic release"],
            "A macroeconomic data publication",
        );
        self.add_class(
            SEI_DOC,
            "NewsArticle",
            Some((SEI_DOC, "Document")),
            &["news article", "news"],
            "A financial news article",
        );
        self.add_class(SEI_DOC, "Date", None, &["date"], "A calendar date mention");

        // Risk namespace
        self.add_class(SEI_RISK, "Risk", None, &["risk", "risk factor"], "Any disclosed risk factor");
        self.add_class(
            SEI_RISK,
            "OperationalRisk",
            Some((SEI_RISK, "Risk")),
            &["operational risk"],
            "Risk arising from operations",
        );
        self.add_class(
            SEI_RISK,
            "MarketRisk",
            Some((SEI_RISK, "Risk")),
            &["market risk"],
            "Risk from market movements",
        );
        self.add_class(
            SEI_RISK,
            "FinancialRisk",
            Some((SEI_RISK, "Risk")),
            &["financial risk"],
            "Risk to financial position",
        );
        self.add_class(
            SEI_RISK,
            "SupplyChainRisk",
            Some((SEI_RISK, "OperationalRisk")),
            &["supply chain risk", "supplier risk", "supply chain disruption"],
            "Risk of supply chain disruption",
        );
        self.add_class(
            SEI_RISK,
            "CybersecurityRisk",
            Some((SEI_RISK, "OperationalRisk")),
            &["cybersecurity risk", "cyber risk", "data breach"],
            "Risk of cyber attack or data loss",
        );
        self.add_class(
            SEI_RISK,
            "TechnologyRisk",
            Some((SEI_RISK, "OperationalRisk")),
            &["technology risk", "obsolescence risk"],
            "Risk of technological change or failure",
        );
        self.add_class(
            SEI_RISK,
            "CurrencyRisk",
            Some((SEI_RISK, "MarketRisk")),
            &["currency risk", "foreign exchange risk", "fx risk"],
            "Risk from exchange-rate fluctuation",
        );
        self.add_class(
            SEI_RISK,
            "CompetitiveRisk",
            Some((SEI_RISK, "MarketRisk")),
            &["competitive risk", "competition risk"],
            "Risk from competitive pressure",
        );
        self.add_class(
            SEI_RISK,
            "RegulatoryRisk",
            Some((SEI_RISK, "Risk")),
            &["regulatory risk", "compliance risk", "legal risk"],
            "Risk from regulation or legal action",
        );
        self.add_class(
            SEI_RISK,
            "GeopoliticalRisk",
            Some((SEI_RISK, "Risk")),
            &["geopolitical risk", "political risk"],
            "Risk from geopolitical events",
        );

        // Economic namespace
        self.add_class(
            SEI_ECON,
            "EconomicIndicator",
            None,
            &["economic indicator"],
            "A macroeconomic measure",
        );
        self.add_class(
            SEI_ECON,
            "InterestRate",
            Some((SEI_ECON, "EconomicIndicator")),
            &["interest rate", "federal funds rate"],
            "A benchmark interest rate",
        );
        self.add_class(
            SEI_ECON,
            "InflationRate",
            Some((SEI_ECON, "EconomicIndicator")),
            &["inflation rate", "cpi"],
            "A measure of price inflation",
        );
        self.add_class(
            SEI_ECON,
            "GrossDomesticProduct",
            Some((SEI_ECON, "EconomicIndicator")),
            &["gdp", "gross domestic product"],
            "Gross domestic product",
        );
    }

    fn register_entity_mappings(&mut self) {
        use ns::*;

        let mappings: [(EntityType, &str, &str); 18] = [
            (EntityType::Company, SEI_CO, "Company"),
            (EntityType::Person, SEI_CO, "Person"),
            (EntityType::Product, SEI_CO, "Product"),
            (EntityType::Revenue, SEI_FIN, "Revenue"),
            (EntityType::NetIncome, SEI_FIN, "NetIncome"),
            (EntityType::EarningsPerShare, SEI_FIN, "EarningsPerShare"),
            (EntityType::TotalAssets, SEI_FIN, "TotalAssets"),
            (EntityType::CashFlow, SEI_FIN, "CashFlow"),
            (EntityType::MonetaryAmount, SEI_FIN, "MonetaryAmount"),
            (EntityType::SupplyChainRisk, SEI_RISK, "SupplyChainRisk"),
            (EntityType::CurrencyRisk, SEI_RISK, "CurrencyRisk"),
            (EntityType::RegulatoryRisk, SEI_RISK, "RegulatoryRisk"),
            (EntityType::GeopoliticalRisk, SEI_RISK, "GeopoliticalRisk"),
            (EntityType::CompetitiveRisk, SEI_RISK, "CompetitiveRisk"),
            (EntityType::CybersecurityRisk, SEI_RISK, "CybersecurityRisk"),
            (EntityType::TechnologyRisk, SEI_RISK, "TechnologyRisk"),
            (EntityType::Date, SEI_DOC, "Date"),
            (EntityType::Percentage, SEI_FIN, "Percentage"),
        ];

        for (entity_type, namespace, name) in mappings {
            self.entity_classes
                .insert(entity_type, format!("{namespace}{name}"));
        }
    }

    fn register_document_mappings(&mut self) {
        use ns::SEI_DOC;

        let mappings: [(DocumentType, &str); 10] = [
            (DocumentType::Form10K, "Form10K"),
            (DocumentType::Form10Q, "Form10Q"),
            (DocumentType::Form8K, "Form8K"),
            (DocumentType::ProxyStatement, "ProxyStatement"),
            (DocumentType::EquityResearch, "EquityResearch"),
            (DocumentType::EarningsCall, "EarningsCallTranscript"),
            (DocumentType::PressRelease, "PressRelease"),
            (DocumentType::EconomicData, "EconomicDataRelease"),
            (DocumentType::NewsArticle, "NewsArticle"),
            (DocumentType::Unknown, "Document"),
        ];

        for (document_type, name) in mappings {
            self.document_classes
                .insert(document_type, format!("{SEI_DOC}{name}"));
        }
    }

    fn register_properties(&mut self) {
        use ns::*;

        let mut add = |predicate: RelationType,
                       namespace: &str,
                       name: &str,
                       domain: String,
                       range: String| {
            self.properties.insert(
                predicate,
                OntologyProperty {
                    uri: format!("{namespace}{name}"),
                    label: name.to_string(),
                    domain,
                    range,
                },
            );
        };

        let company = format!("{SEI_CO}Company");
        let person = format!("{SEI_CO}Person");
        let product = format!("{SEI_CO}Product");
        let metric = format!("{SEI_FIN}FinancialMetric");
        let risk = format!("{SEI_RISK}Risk");
        let indicator = format!("{SEI_ECON}EconomicIndicator");

        add(RelationType::CompetesWith, SEI_CO, "competesWith", company.clone(), company.clone());
        add(RelationType::PartnersWith, SEI_CO, "partnersWith", company.clone(), company.clone());
        add(RelationType::Acquired, SEI_CO, "acquired", company.clone(), company.clone());
        add(RelationType::SubsidiaryOf, SEI_CO, "subsidiaryOf", company.clone(), company.clone());
        add(RelationType::Reported, SEI_FIN, "reported", company.clone(), metric.clone());
        add(RelationType::Generated, SEI_FIN, "generated", company.clone(), metric);
        add(RelationType::FacesRisk, SEI_RISK, "facesRisk", company.clone(), risk);
        add(RelationType::Manufactures, SEI_CO, "manufactures", company.clone(), product.clone());
        add(RelationType::Sells, SEI_CO, "sells", company.clone(), product);
        add(RelationType::CeoOf, SEI_CO, "ceoOf", person.clone(), company.clone());
        add(RelationType::WorksAt, SEI_CO, "worksAt", person, company.clone());
        add(RelationType::ImpactedBy, SEI_ECON, "impactedBy", company, indicator);
    }

    fn register_valid_pairs(&mut self) {
        use EntityType::*;
        use RelationType::*;

        let metrics = [Revenue, NetIncome, EarningsPerShare, TotalAssets, CashFlow, MonetaryAmount];
        let risks = [
            SupplyChainRisk,
            CurrencyRisk,
            RegulatoryRisk,
            GeopoliticalRisk,
            CompetitiveRisk,
            CybersecurityRisk,
            TechnologyRisk,
        ];

        for predicate in [CompetesWith, PartnersWith, Acquired, SubsidiaryOf] {
            self.valid_pairs.insert((Company, predicate, Company));
        }
        for metric in metrics {
            self.valid_pairs.insert((Company, Reported, metric));
        }
        for metric in [Revenue, MonetaryAmount] {
            self.valid_pairs.insert((Company, Generated, metric));
        }
        for risk in risks {
            self.valid_pairs.insert((Company, FacesRisk, risk));
        }
        for predicate in [Manufactures, Sells] {
            self.valid_pairs.insert((Company, predicate, Product));
        }
        for predicate in [CeoOf, WorksAt] {
            self.valid_pairs.insert((Person, predicate, Company));
        }
        // IMPACTED_BY ranges over economic indicators, which are not an
        // extractable entity type; the pair table stays empty for it and the
        // gate rejects any such edge.
    }

    fn register_ancestors(&mut self) {
        use EntityType::*;

        let chains: [(EntityType, &[&'static str]); 18] = [
            (Company, &["Organization"]),
            (Person, &[]),
            (Product, &[]),
            (Revenue, &["FinancialMetric"]),
            (NetIncome, &["FinancialMetric"]),
            (EarningsPerShare, &["FinancialMetric"]),
            (TotalAssets, &["FinancialMetric"]),
            (CashFlow, &["FinancialMetric"]),
            (MonetaryAmount, &["FinancialMetric"]),
            (SupplyChainRisk, &["Risk", "OperationalRisk"]),
            (CybersecurityRisk, &["Risk", "OperationalRisk"]),
            (TechnologyRisk, &["Risk", "OperationalRisk"]),
            (CurrencyRisk, &["Risk", "MarketRisk"]),
            (CompetitiveRisk, &["Risk", "MarketRisk"]),
            (RegulatoryRisk, &["Risk"]),
            (GeopoliticalRisk, &["Risk"]),
            (Date, &[]),
            (Percentage, &[]),
        ];

        for (entity_type, chain) in chains {
            self.ancestors.insert(entity_type, chain.to_vec());
        }
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Map an entity type to its ontology class URI
    pub fn map_entity_type(&self, entity_type: EntityType) -> Result<&str> {
        self.entity_classes
            .get(&entity_type)
            .map(String::as_str)
            .ok_or_else(|| FidrError::UnmappedType(format!("entity type {entity_type}")))
    }

    /// Map a relation predicate to its ontology property URI
    pub fn map_relation_type(&self, predicate: RelationType) -> Result<&str> {
        self.properties
            .get(&predicate)
            .map(|p| p.uri.as_str())
            .ok_or_else(|| FidrError::UnmappedType(format!("relation type {predicate}")))
    }

    /// Map a document type to its ontology class URI
    pub fn map_document_type(&self, document_type: DocumentType) -> Result<&str> {
        self.document_classes
            .get(&document_type)
            .map(String::as_str)
            .ok_or_else(|| FidrError::UnmappedType(format!("document type {document_type}")))
    }

    /// Whether the concrete (subject, predicate, object) type triple is
    /// permitted by the ontology
    pub fn validate_relation(
        &self,
        subject: EntityType,
        predicate: RelationType,
        object: EntityType,
    ) -> bool {
        self.valid_pairs.contains(&(subject, predicate, object))
    }

    /// Ordered superclass labels for an entity type, coarsest first
    ///
    /// Used for graph-node labelling: Revenue yields `["FinancialMetric"]`,
    /// SupplyChainRisk yields `["Risk", "OperationalRisk"]`.
    pub fn ancestor_labels(&self, entity_type: EntityType) -> &[&'static str] {
        self.ancestors
            .get(&entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a class by URI
    pub fn get_class(&self, uri: &str) -> Option<&OntologyClass> {
        self.classes.get(uri)
    }

    /// Look up the property definition for a predicate
    pub fn get_property(&self, predicate: RelationType) -> Option<&OntologyProperty> {
        self.properties.get(&predicate)
    }

    /// Resolve a surface form to a class URI via the alias index
    pub fn resolve_alias(&self, text: &str) -> Option<&str> {
        self.alias_index
            .get(&text.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Superclass chain for a class URI, nearest parent first
    pub fn class_hierarchy(&self, uri: &str) -> Vec<&OntologyClass> {
        let mut chain = Vec::new();
        let mut current = self.classes.get(uri).and_then(|c| c.parent.as_deref());
        while let Some(parent_uri) = current {
            match self.classes.get(parent_uri) {
                Some(parent) => {
                    chain.push(parent);
                    current = parent.parent.as_deref();
                }
                None => break,
            }
        }
        chain
    }

    /// Whether `uri` is a (transitive) subclass of `parent_uri`
    pub fn is_subclass_of(&self, uri: &str, parent_uri: &str) -> bool {
        self.class_hierarchy(uri)
            .iter()
            .any(|class| class.uri == parent_uri)
    }

    /// Prefix -> namespace bindings for RDF serialization
    pub fn prefix_bindings(&self) -> &'static [(&'static str, &'static str)] {
        &PREFIX_BINDINGS
    }

    /// Number of registered classes
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entity_type_maps_to_a_registered_class() {
        let schema = OntologySchema::new();
        for entity_type in EntityType::ALL {
            let uri = schema.map_entity_type(entity_type).unwrap();
            assert!(
                schema.get_class(uri).is_some(),
                "{entity_type} maps to unregistered class {uri}"
            );
        }
    }

    #[test]
    fn test_every_predicate_maps_to_a_property() {
        let schema = OntologySchema::new();
        let uri = schema.map_relation_type(RelationType::FacesRisk).unwrap();
        assert_eq!(uri, format!("{}facesRisk", ns::SEI_RISK));
        assert!(schema.map_relation_type(RelationType::ImpactedBy).is_ok());
    }

    #[test]
    fn test_valid_pairs() {
        let schema = OntologySchema::new();
        assert!(schema.validate_relation(
            EntityType::Company,
            RelationType::CompetesWith,
            EntityType::Company
        ));
        assert!(schema.validate_relation(
            EntityType::Company,
            RelationType::Reported,
            EntityType::Revenue
        ));
        assert!(schema.validate_relation(
            EntityType::Company,
            RelationType::FacesRisk,
            EntityType::SupplyChainRisk
        ));
        assert!(schema.validate_relation(
            EntityType::Person,
            RelationType::CeoOf,
            EntityType::Company
        ));
    }

    #[test]
    fn test_invalid_pairs_rejected() {
        let schema = OntologySchema::new();
        // Products do not compete; metrics do not face risks.
        assert!(!schema.validate_relation(
            EntityType::Product,
            RelationType::CompetesWith,
            EntityType::Company
        ));
        assert!(!schema.validate_relation(
            EntityType::Revenue,
            RelationType::FacesRisk,
            EntityType::SupplyChainRisk
        ));
        // IMPACTED_BY has no extractable range type.
        assert!(!schema.validate_relation(
            EntityType::Company,
            RelationType::ImpactedBy,
            EntityType::Percentage
        ));
    }

    #[test]
    fn test_ancestor_labels() {
        let schema = OntologySchema::new();
        assert_eq!(schema.ancestor_labels(EntityType::Revenue), &["FinancialMetric"]);
        assert_eq!(
            schema.ancestor_labels(EntityType::SupplyChainRisk),
            &["Risk", "OperationalRisk"]
        );
        assert!(schema.ancestor_labels(EntityType::Date).is_empty());
    }

    #[test]
    fn test_class_hierarchy_walk() {
        let schema = OntologySchema::new();
        let supply = format!("{}SupplyChainRisk", ns::SEI_RISK);
        let risk = format!("{}Risk", ns::SEI_RISK);
        let chain = schema.class_hierarchy(&supply);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].label, "OperationalRisk");
        assert_eq!(chain[1].label, "Risk");
        assert!(schema.is_subclass_of(&supply, &risk));
        assert!(!schema.is_subclass_of(&risk, &supply));
    }

    #[test]
    fn test_alias_resolution() {
        let schema = OntologySchema::new();
        assert_eq!(
            schema.resolve_alias("Supply Chain Risk"),
            Some(format!("{}SupplyChainRisk", ns::SEI_RISK).as_str())
        );
        assert_eq!(
            schema.resolve_alias("eps"),
            Some(format!("{}EarningsPerShare", ns::SEI_FIN).as_str())
        );
        assert_eq!(schema.resolve_alias("no such thing"), None);
    }

    #[test]
    fn test_document_mapping() {
        let schema = OntologySchema::new();
        assert_eq!(
            schema.map_document_type(DocumentType::Form10K).unwrap(),
            format!("{}Form10K", ns::SEI_DOC)
        );
        assert_eq!(
            schema.map_document_type(DocumentType::Unknown).unwrap(),
            format!("{}Document", ns::SEI_DOC)
        );
    }
}
