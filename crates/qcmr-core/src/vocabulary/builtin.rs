use crate::error::QcmrError;
use crate::vocabulary::parse_vocabulary_str;
use crate::vocabulary::schema::VocabularyDef;

const GF_REVENUE_JSON: &str = include_str!("../../../../vocabularies/gf-revenue.json");
const GF_SPENDING_JSON: &str = include_str!("../../../../vocabularies/gf-spending.json");
const GF_BALANCE_SHEET_JSON: &str = include_str!("../../../../vocabularies/gf-balance-sheet.json");
const FUND_BALANCES_JSON: &str = include_str!("../../../../vocabularies/fund-balances.json");

/// Sections with a built-in vocabulary.
pub const PRESETS: &[&str] = &["gf_revenue", "gf_spending", "gf_balance_sheet", "fund_balances"];

/// Load the built-in vocabulary for a section.
pub fn load_preset(section: &str) -> Result<VocabularyDef, QcmrError> {
    let json = match section {
        "gf_revenue" => GF_REVENUE_JSON,
        "gf_spending" => GF_SPENDING_JSON,
        "gf_balance_sheet" => GF_BALANCE_SHEET_JSON,
        "fund_balances" => FUND_BALANCES_JSON,
        _ => {
            return Err(QcmrError::VocabularyInvalid(format!(
                "no built-in vocabulary for '{}'. Available: {}",
                section,
                PRESETS.join(", ")
            )))
        }
    };
    parse_vocabulary_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_load() {
        for name in PRESETS {
            let v = load_preset(name).unwrap();
            assert_eq!(&v.section, name);
        }
    }

    #[test]
    fn test_revenue_spellings() {
        let v = load_preset("gf_revenue").unwrap();
        assert_eq!(v.lookup("Real Estate Tax"), Some("real_estate_tax"));
        assert_eq!(v.lookup("Locally Generated Non-tax"), Some("locally_generated_non_tax"));
        assert_eq!(v.lookup("Locally Generated Non-Tax"), Some("locally_generated_non_tax"));
        assert_eq!(v.lookup("TOTAL CASH RECEIPTS"), Some("total_cash_receipts"));
    }

    #[test]
    fn test_spending_spellings() {
        let v = load_preset("gf_spending").unwrap();
        assert_eq!(v.lookup("Purchase of Services"), Some("purchases_of_services"));
        assert_eq!(v.lookup("Purchases of Services"), Some("purchases_of_services"));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("leave_usage").is_err());
    }
}
