// ==========================================
// IPO Validation - Composite Key Parser
// ==========================================
// "COMPANY_PLANT_PARTNUM": split on '_' at most twice, so part numbers
// keep their own underscores and spaces.
// ==========================================

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    pub company: String,
    pub plant: String,
    pub part_num: String,
}

/// Key with fewer than three segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedKey {
    pub raw: String,
    pub segments: usize,
}

impl fmt::Display for MalformedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "composite key '{}' has {} segment(s), expected 3",
            self.raw, self.segments
        )
    }
}

impl CompositeKey {
    pub fn parse(raw: &str) -> Result<Self, MalformedKey> {
        let mut parts = raw.splitn(3, '_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(company), Some(plant), Some(part_num)) => Ok(Self {
                company: company.to_string(),
                plant: plant.to_string(),
                part_num: part_num.to_string(),
            }),
            (first, second, _) => Err(MalformedKey {
                raw: raw.to_string(),
                segments: usize::from(first.is_some()) + usize::from(second.is_some()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_space_in_part_number() {
        let key = CompositeKey::parse("SAINC_MfgSys_ABX 326").unwrap();
        assert_eq!(key.company, "SAINC");
        assert_eq!(key.plant, "MfgSys");
        assert_eq!(key.part_num, "ABX 326");
    }

    #[test]
    fn test_parse_only_first_two_underscores_split() {
        let key = CompositeKey::parse("SAUK_UKP_AB_12_X").unwrap();
        assert_eq!(key.company, "SAUK");
        assert_eq!(key.plant, "UKP");
        assert_eq!(key.part_num, "AB_12_X");
    }

    #[test]
    fn test_parse_empty_segments_are_kept() {
        let key = CompositeKey::parse("SAINC__P1").unwrap();
        assert_eq!(key.plant, "");
        assert_eq!(key.part_num, "P1");
    }

    #[test]
    fn test_parse_malformed() {
        let err = CompositeKey::parse("SAINC_MfgSys").unwrap_err();
        assert_eq!(err.segments, 2);
        assert_eq!(CompositeKey::parse("NOUNDERSCORE").unwrap_err().segments, 1);
    }
}
