//! Company registry
//!
//! Static registry of covered public companies with SEC EDGAR metadata.
//! Backs the company listing surface and gives the pipeline ticker, CIK
//! and competitor context without a network fetch.

use serde::{Deserialize, Serialize};

/// Industry sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Technology,
    Healthcare,
    FinancialServices,
    Consumer,
    Energy,
    Industrials,
}

impl Sector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Healthcare => "Healthcare",
            Self::FinancialServices => "Financial Services",
            Self::Consumer => "Consumer",
            Self::Energy => "Energy",
            Self::Industrials => "Industrials",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "technology" | "tech" => Some(Self::Technology),
            "healthcare" | "health" => Some(Self::Healthcare),
            "financial services" | "financial" | "finance" => Some(Self::FinancialServices),
            "consumer" => Some(Self::Consumer),
            "energy" => Some(Self::Energy),
            "industrials" | "industrial" => Some(Self::Industrials),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered company with EDGAR metadata
#[derive(Debug, Clone, Serialize)]
pub struct CompanyInfo {
    pub ticker: &'static str,
    pub name: &'static str,
    pub cik: &'static str,
    pub sector: Sector,
    pub industry: &'static str,
    pub sp500: bool,
    /// Competitor tickers
    pub competitors: &'static [&'static str],
}

impl CompanyInfo {
    /// CIK padded to the 10 digits EDGAR URLs expect
    pub fn cik_padded(&self) -> String {
        format!("{:0>10}", self.cik.trim_start_matches('0'))
    }
}

/// Static company registry
pub struct CompanyRegistry {
    companies: Vec<CompanyInfo>,
}

impl CompanyRegistry {
    pub fn new() -> Self {
        Self {
            companies: COMPANIES.to_vec(),
        }
    }

    /// Company by ticker symbol, case-insensitive
    pub fn get(&self, ticker: &str) -> Option<&CompanyInfo> {
        self.companies
            .iter()
            .find(|c| c.ticker.eq_ignore_ascii_case(ticker.trim()))
    }

    /// Company by CIK number, ignoring leading zeros
    pub fn get_by_cik(&self, cik: &str) -> Option<&CompanyInfo> {
        let normalized = cik.trim_start_matches('0');
        self.companies
            .iter()
            .find(|c| c.cik.trim_start_matches('0') == normalized)
    }

    /// All companies in a sector
    pub fn by_sector(&self, sector: Sector) -> Vec<&CompanyInfo> {
        self.companies
            .iter()
            .filter(|c| c.sector == sector)
            .collect()
    }

    /// Every registered company
    pub fn all(&self) -> &[CompanyInfo] {
        &self.companies
    }

    /// All ticker symbols
    pub fn tickers(&self) -> Vec<&'static str> {
        self.companies.iter().map(|c| c.ticker).collect()
    }

    /// Companies whose ticker or name contains the query
    pub fn search(&self, query: &str) -> Vec<&CompanyInfo> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.companies
            .iter()
            .filter(|c| {
                c.ticker.to_lowercase().contains(&needle)
                    || c.name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

impl Default for CompanyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

const COMPANIES: &[CompanyInfo] = &[
    // Technology
    CompanyInfo {
        ticker: "AAPL",
        name: "Apple Inc.",
        cik: "0000320193",
        sector: Sector::Technology,
        industry: "Consumer Electronics",
        sp500: true,
        competitors: &["MSFT", "GOOGL"],
    },
    CompanyInfo {
        ticker: "MSFT",
        name: "Microsoft Corporation",
        cik: "0000789019",
        sector: Sector::Technology,
        industry: "Software & Cloud Services",
        sp500: true,
        competitors: &["AAPL", "GOOGL", "AMZN", "ORCL"],
    },
    CompanyInfo {
        ticker: "GOOGL",
        name: "Alphabet Inc.",
        cik: "0001652044",
        sector: Sector::Technology,
        industry: "Internet Services & AI",
        sp500: true,
        competitors: &["MSFT", "META", "AMZN"],
    },
    CompanyInfo {
        ticker: "AMZN",
        name: "Amazon.com, Inc.",
        cik: "0001018724",
        sector: Sector::Technology,
        industry: "E-commerce & Cloud Computing",
        sp500: true,
        competitors: &["MSFT", "GOOGL", "WMT"],
    },
    CompanyInfo {
        ticker: "NVDA",
        name: "NVIDIA Corporation",
        cik: "0001045810",
        sector: Sector::Technology,
        industry: "Semiconductors",
        sp500: true,
        competitors: &["AMD", "INTC"],
    },
    CompanyInfo {
        ticker: "META",
        name: "Meta Platforms, Inc.",
        cik: "0001326801",
        sector: Sector::Technology,
        industry: "Social Media",
        sp500: true,
        competitors: &["GOOGL", "SNAP"],
    },
    CompanyInfo {
        ticker: "INTC",
        name: "Intel Corporation",
        cik: "0000050863",
        sector: Sector::Technology,
        industry: "Semiconductors",
        sp500: true,
        competitors: &["AMD", "NVDA"],
    },
    CompanyInfo {
        ticker: "ORCL",
        name: "Oracle Corporation",
        cik: "0001341439",
        sector: Sector::Technology,
        industry: "Enterprise Software & Cloud",
        sp500: true,
        competitors: &["MSFT", "SAP", "IBM"],
    },
    // Healthcare
    CompanyInfo {
        ticker: "JNJ",
        name: "Johnson & Johnson",
        cik: "0000200406",
        sector: Sector::Healthcare,
        industry: "Pharmaceuticals & Medical Devices",
        sp500: true,
        competitors: &["PFE", "MRK"],
    },
    CompanyInfo {
        ticker: "PFE",
        name: "Pfizer Inc.",
        cik: "0000078003",
        sector: Sector::Healthcare,
        industry: "Pharmaceuticals",
        sp500: true,
        competitors: &["JNJ", "MRK"],
    },
    CompanyInfo {
        ticker: "UNH",
        name: "UnitedHealth Group Incorporated",
        cik: "0000731766",
        sector: Sector::Healthcare,
        industry: "Health Insurance",
        sp500: true,
        competitors: &["CVS", "CI"],
    },
    // Financial services
    CompanyInfo {
        ticker: "JPM",
        name: "JPMorgan Chase & Co.",
        cik: "0000019617",
        sector: Sector::FinancialServices,
        industry: "Banking",
        sp500: true,
        competitors: &["BAC", "GS", "MS"],
    },
    CompanyInfo {
        ticker: "GS",
        name: "The Goldman Sachs Group, Inc.",
        cik: "0000886982",
        sector: Sector::FinancialServices,
        industry: "Investment Banking",
        sp500: true,
        competitors: &["MS", "JPM"],
    },
    CompanyInfo {
        ticker: "V",
        name: "Visa Inc.",
        cik: "0001403161",
        sector: Sector::FinancialServices,
        industry: "Payment Processing",
        sp500: true,
        competitors: &["MA", "AXP"],
    },
    // Consumer
    CompanyInfo {
        ticker: "WMT",
        name: "Walmart Inc.",
        cik: "0000104169",
        sector: Sector::Consumer,
        industry: "Retail",
        sp500: true,
        competitors: &["AMZN", "TGT", "COST"],
    },
    CompanyInfo {
        ticker: "KO",
        name: "The Coca-Cola Company",
        cik: "0000021344",
        sector: Sector::Consumer,
        industry: "Beverages",
        sp500: true,
        competitors: &["PEP"],
    },
    // Energy
    CompanyInfo {
        ticker: "XOM",
        name: "Exxon Mobil Corporation",
        cik: "0000034088",
        sector: Sector::Energy,
        industry: "Oil & Gas",
        sp500: true,
        competitors: &["CVX", "COP"],
    },
    CompanyInfo {
        ticker: "CVX",
        name: "Chevron Corporation",
        cik: "0000093410",
        sector: Sector::Energy,
        industry: "Oil & Gas",
        sp500: true,
        competitors: &["XOM", "COP"],
    },
    // Industrials
    CompanyInfo {
        ticker: "BA",
        name: "The Boeing Company",
        cik: "0000012927",
        sector: Sector::Industrials,
        industry: "Aerospace & Defense",
        sp500: true,
        competitors: &["LMT", "RTX"],
    },
    CompanyInfo {
        ticker: "CAT",
        name: "Caterpillar Inc.",
        cik: "0000018230",
        sector: Sector::Industrials,
        industry: "Heavy Equipment",
        sp500: true,
        competitors: &["DE"],
    },
];

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_case_insensitive() {
        let registry = CompanyRegistry::new();
        let apple = registry.get("aapl").unwrap();
        assert_eq!(apple.name, "Apple Inc.");
        assert!(registry.get("ZZZZ").is_none());
    }

    #[test]
    fn test_get_by_cik_ignores_leading_zeros() {
        let registry = CompanyRegistry::new();
        assert_eq!(registry.get_by_cik("320193").unwrap().ticker, "AAPL");
        assert_eq!(registry.get_by_cik("0000320193").unwrap().ticker, "AAPL");
    }

    #[test]
    fn test_cik_padded() {
        let registry = CompanyRegistry::new();
        assert_eq!(registry.get("AAPL").unwrap().cik_padded(), "0000320193");
    }

    #[test]
    fn test_by_sector() {
        let registry = CompanyRegistry::new();
        let tech = registry.by_sector(Sector::Technology);
        assert!(tech.len() >= 8);
        assert!(tech.iter().all(|c| c.sector == Sector::Technology));
    }

    #[test]
    fn test_search() {
        let registry = CompanyRegistry::new();
        let hits = registry.search("morgan");
        assert!(hits.iter().any(|c| c.ticker == "JPM"));
        assert!(registry.search("  ").is_empty());
    }

    #[test]
    fn test_sector_parse() {
        assert_eq!(Sector::parse("tech"), Some(Sector::Technology));
        assert_eq!(Sector::parse("Financial Services"), Some(Sector::FinancialServices));
        assert_eq!(Sector::parse("unknown"), None);
    }
}
