use crate::constants::NO_DATA;

const BRACKETS: [char; 2] = ['(', '（'];

/// Dedup key for a company display name.
///
/// Drops everything from the first half- or full-width opening bracket on
/// (trimming what is left), then removes spaces, hyphens and underscores.
/// Names that are absent, or become empty, map to [`NO_DATA`].
pub fn canonicalize(raw: &str) -> String {
    let key = canonical_key(raw);
    if key.is_empty() {
        NO_DATA.to_string()
    } else {
        key
    }
}

/// Same reduction as [`canonicalize`] but an empty result stays `""`.
///
/// The cleaning run groups on this so that annotation-only names such as
/// `(X)` do not merge with genuine no-data rows.
pub fn canonical_key(raw: &str) -> String {
    if raw == NO_DATA {
        return NO_DATA.to_string();
    }

    let head = match raw.find(BRACKETS) {
        Some(idx) => raw[..idx].trim(),
        None => raw,
    };

    head.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_half_width_annotation() {
        assert_eq!(canonicalize("甲公司(Alpha Corp)"), "甲公司");
        assert_eq!(canonicalize("沃尔玛 (WALMART)"), "沃尔玛");
    }

    #[test]
    fn strips_full_width_annotation() {
        assert_eq!(canonicalize("亚马逊（AMAZON.COM）"), "亚马逊");
    }

    #[test]
    fn cuts_at_whichever_bracket_comes_first() {
        assert_eq!(canonicalize("甲（乙）(丙)"), "甲");
        assert_eq!(canonicalize("甲(乙)（丙）"), "甲");
    }

    #[test]
    fn removes_formatting_characters() {
        assert_eq!(canonicalize("Berkshire Hathaway"), "BerkshireHathaway");
        assert_eq!(canonicalize("Mercedes-Benz_Group"), "MercedesBenzGroup");
        assert_eq!(canonicalize("  Exxon - Mobil (XOM)"), "ExxonMobil");
    }

    #[test]
    fn sentinel_and_empty_names() {
        assert_eq!(canonicalize("无数据"), "无数据");
        assert_eq!(canonicalize(""), "无数据");
        assert_eq!(canonicalize("(only annotation)"), "无数据");
        assert_eq!(canonicalize(" - "), "无数据");
    }

    #[test]
    fn raw_key_keeps_empty_results_apart() {
        assert_eq!(canonical_key("(X)"), "");
        assert_eq!(canonical_key(""), "");
        assert_eq!(canonical_key("无数据"), "无数据");
        assert_eq!(canonical_key("甲 公司（A）"), "甲公司");
    }

    #[test]
    fn is_idempotent_on_known_names() {
        let samples = [
            "甲公司(Alpha Corp)",
            "亚马逊（AMAZON.COM）",
            "甲（乙）(丙)",
            "  Exxon - Mobil (XOM)",
            "\tTabbed Name ",
            "无数据",
            "",
            "(x)",
            "a_b-c d",
        ];
        for sample in samples {
            let once = canonicalize(sample);
            assert_eq!(canonicalize(&once), once, "input {sample:?}");
        }
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(raw in "[甲乙丙无数据Ab ()（）_\\-\t]{0,24}") {
            let once = canonicalize(&raw);
            prop_assert_eq!(canonicalize(&once), once);
        }

        #[test]
        fn canonical_form_has_no_brackets_or_separators(raw in "\\PC{0,32}") {
            let key = canonicalize(&raw);
            prop_assert!(!key.is_empty());
            prop_assert!(!key.contains(['(', '（', ' ', '-', '_']));
        }

        #[test]
        fn raw_key_agrees_with_canonicalize_when_non_empty(raw in "[甲乙Ab ()（）_\\-]{0,16}") {
            let key = canonical_key(&raw);
            if !key.is_empty() {
                prop_assert_eq!(canonicalize(&raw), key);
            }
        }
    }
}
