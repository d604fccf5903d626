use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Root document of `roms.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Catalog {
    pub roms: Vec<RomFamily>,
}

/// One top-level record: a family of builds for a single platform version.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RomFamily {
    pub family: String,
    #[serde(rename = "android", deserialize_with = "platform_version")]
    pub platform_version: String,
    pub versions: Vec<RomVersion>,
}

/// A single build inside a family.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RomVersion {
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    pub name: String,
    pub url: String,
}

/// Alternative packaging of a build (e.g. GApps / vanilla).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Variant {
    #[serde(rename = "type")]
    pub kind: String,
    pub links: Vec<Link>,
}

/// All versions sharing one family label inside a platform group.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyBucket<'a> {
    pub family: &'a str,
    pub versions: Vec<&'a RomVersion>,
}

/// Every family published for one platform version.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformGroup<'a> {
    pub platform_version: &'a str,
    pub families: Vec<FamilyBucket<'a>>,
}

impl PlatformGroup<'_> {
    pub fn version_count(&self) -> usize {
        self.families.iter().map(|f| f.versions.len()).sum()
    }
}

/// `android` may be written as `"14"` or `14`; both normalise to `"14"`.
fn platform_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => Ok(s),
        Raw::Number(n) => Ok(match n.as_f64() {
            // Integral floats print without a fraction, in full below 1e21.
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
                if f == 0.0 { "0".to_string() } else { format!("{f:.0}") }
            }
            _ => n.to_string(),
        }),
    }
}

/// Total number of version records across all families.
pub fn count_entries(catalog: &Catalog) -> usize {
    catalog.roms.iter().map(|rom| rom.versions.len()).sum()
}

/// Partition the catalog by platform version, newest platform first.
///
/// Families keep their first-seen order inside a group and records that share
/// a family label are merged into one bucket, versions in input order.
pub fn group_by_platform_version(catalog: &Catalog) -> Vec<PlatformGroup<'_>> {
    let mut groups: Vec<PlatformGroup<'_>> = Vec::new();
    let mut group_index: HashMap<&str, usize> = HashMap::new();
    let mut family_index: HashMap<(&str, &str), usize> = HashMap::new();

    for rom in &catalog.roms {
        let gi = *group_index
            .entry(rom.platform_version.as_str())
            .or_insert_with(|| {
                groups.push(PlatformGroup {
                    platform_version: &rom.platform_version,
                    families: Vec::new(),
                });
                groups.len() - 1
            });
        let group = &mut groups[gi];

        let fi = *family_index
            .entry((rom.platform_version.as_str(), rom.family.as_str()))
            .or_insert_with(|| {
                group.families.push(FamilyBucket {
                    family: &rom.family,
                    versions: Vec::new(),
                });
                group.families.len() - 1
            });
        group.families[fi].versions.extend(rom.versions.iter());
    }

    groups.sort_by(|a, b| compare_platform_versions(b.platform_version, a.platform_version));
    log::debug!("grouped {} records into {} platform groups", catalog.roms.len(), groups.len());
    groups
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Number(&'a str),
    Text(&'a str),
}

fn segments(key: &str) -> Vec<Segment<'_>> {
    static SPLIT: OnceLock<Regex> = OnceLock::new();
    let re = SPLIT.get_or_init(|| Regex::new(r"[0-9]+|[^0-9]+").expect("static pattern"));
    re.find_iter(key)
        .map(|m| {
            let s = m.as_str();
            if s.as_bytes()[0].is_ascii_digit() {
                Segment::Number(s)
            } else {
                Segment::Text(s)
            }
        })
        .collect()
}

/// Compare two digit runs by value without parsing (runs may exceed u64).
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Ascending natural order of platform-version keys.
///
/// Digit runs compare numerically, other runs lexicographically, a digit run
/// ranks above text, a shorter prefix ranks lower. Keys equal under these
/// rules (`"14"` vs `"014"`) fall back to plain string order.
pub fn compare_platform_versions(a: &str, b: &str) -> Ordering {
    let sa = segments(a);
    let sb = segments(b);

    for (x, y) in sa.iter().zip(sb.iter()) {
        let ord = match (x, y) {
            (Segment::Number(x), Segment::Number(y)) => compare_digits(x, y),
            (Segment::Text(x), Segment::Text(y)) => x.cmp(y),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    sa.len().cmp(&sb.len()).then_with(|| a.cmp(b))
}

pub fn counter_label(total: usize) -> String {
    format!("{total} прошивок")
}

pub fn families_label(count: usize) -> String {
    format!("{count} семейств")
}

pub fn versions_label(count: usize) -> String {
    format!("{count} версий")
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_count_entries_sample() {
        assert_eq!(count_entries(&sample()), 6);
        assert_eq!(counter_label(count_entries(&sample())), "6 прошивок");
    }

    #[test]
    fn test_count_entries_empty() {
        assert_eq!(count_entries(&Catalog::default()), 0);
    }

    #[test]
    fn test_groups_descending() {
        let catalog = sample();
        let groups = group_by_platform_version(&catalog);
        let keys: Vec<&str> = groups.iter().map(|g| g.platform_version).collect();
        assert_eq!(keys, vec!["14", "13"]);
        assert_eq!(groups[0].families.len(), 2);
        assert_eq!(groups[0].families[0].family, "LineageOS");
        assert_eq!(groups[0].families[1].family, "PixelOS");
        assert_eq!(groups[0].version_count(), 5);
    }

    #[test]
    fn test_numeric_not_lexical() {
        let catalog = Catalog {
            roms: vec![
                family("a", "9", &["x"]),
                family("b", "10", &["y"]),
                family("c", "12.1", &["z"]),
                family("d", "12", &["w"]),
            ],
        };
        let groups = group_by_platform_version(&catalog);
        let keys: Vec<&str> = groups.iter().map(|g| g.platform_version).collect();
        assert_eq!(keys, vec!["12.1", "12", "10", "9"]);
    }

    #[test]
    fn test_same_family_label_merged() {
        let catalog = Catalog {
            roms: vec![
                family("LineageOS", "14", &["a"]),
                family("crDroid", "14", &["b"]),
                family("LineageOS", "14", &["c"]),
                family("LineageOS", "13", &["d"]),
            ],
        };
        let groups = group_by_platform_version(&catalog);
        assert_eq!(groups[0].families.len(), 2);
        let names: Vec<&str> = groups[0].families[0]
            .versions
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(groups[1].families[0].versions.len(), 1);
    }

    #[test]
    fn test_mixed_keys_order() {
        assert_eq!(compare_platform_versions("14", "beta"), Ordering::Greater);
        assert_eq!(compare_platform_versions("14", "14 QPR"), Ordering::Less);
        assert_eq!(compare_platform_versions("014", "14"), Ordering::Less);
        assert_eq!(compare_platform_versions("14", "14"), Ordering::Equal);
        assert_eq!(
            compare_platform_versions("99999999999999999999999", "1"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_android_number_or_string() {
        let json = r#"{"roms":[
            {"family":"A","android":14,"versions":[{"name":"v1"}]},
            {"family":"B","android":"13","versions":[]},
            {"family":"C","android":12.1,"versions":[]},
            {"family":"D","android":11.0,"versions":[]}
        ]}"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = catalog.roms.iter().map(|r| r.platform_version.as_str()).collect();
        assert_eq!(keys, vec!["14", "13", "12.1", "11"]);
        assert!(catalog.roms[0].versions[0].links.is_empty());
        assert!(catalog.roms[0].versions[0].date.is_none());
    }

    #[test]
    fn test_android_large_integral_float() {
        let json = r#"{"roms":[
            {"family":"A","android":1e20,"versions":[]},
            {"family":"B","android":-0.0,"versions":[]},
            {"family":"C","android":18446744073709551615,"versions":[]}
        ]}"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = catalog.roms.iter().map(|r| r.platform_version.as_str()).collect();
        assert_eq!(keys, vec!["100000000000000000000", "0", "18446744073709551615"]);
    }

    #[test]
    fn test_missing_versions_rejected() {
        let json = r#"{"roms":[{"family":"A","android":"14"}]}"#;
        assert!(serde_json::from_str::<Catalog>(json).is_err());
    }

    fn arb_catalog() -> impl Strategy<Value = Catalog> {
        let rom = (
            prop::sample::select(vec!["Lineage", "crDroid", "Evolution", "Pixel"]),
            prop::sample::select(vec!["9", "10", "12", "12.1", "13", "14", "beta"]),
            prop::collection::vec("[a-z0-9.]{1,6}", 0..4),
        )
            .prop_map(|(fam, android, names)| RomFamily {
                family: fam.to_string(),
                platform_version: android.to_string(),
                versions: names.iter().map(|n| version(n)).collect(),
            });
        prop::collection::vec(rom, 0..12).prop_map(|roms| Catalog { roms })
    }

    proptest! {
        #[test]
        fn prop_count_matches_versions(catalog in arb_catalog()) {
            let expected: usize = catalog.roms.iter().map(|r| r.versions.len()).sum();
            prop_assert_eq!(count_entries(&catalog), expected);
            let grouped: usize = group_by_platform_version(&catalog).iter().map(|g| g.version_count()).sum();
            prop_assert_eq!(grouped, expected);
        }

        #[test]
        fn prop_groups_strictly_descending(catalog in arb_catalog()) {
            let groups = group_by_platform_version(&catalog);
            for pair in groups.windows(2) {
                prop_assert_eq!(
                    compare_platform_versions(pair[0].platform_version, pair[1].platform_version),
                    Ordering::Greater
                );
            }
        }

        #[test]
        fn prop_grouping_is_partition(catalog in arb_catalog()) {
            let groups = group_by_platform_version(&catalog);
            for group in &groups {
                for bucket in &group.families {
                    let expected: Vec<&RomVersion> = catalog
                        .roms
                        .iter()
                        .filter(|r| r.platform_version == group.platform_version && r.family == bucket.family)
                        .flat_map(|r| r.versions.iter())
                        .collect();
                    prop_assert_eq!(&bucket.versions, &expected);
                }
                let labels: std::collections::HashSet<&str> =
                    group.families.iter().map(|f| f.family).collect();
                prop_assert_eq!(labels.len(), group.families.len());
            }
            let keys: std::collections::HashSet<&str> =
                groups.iter().map(|g| g.platform_version).collect();
            prop_assert_eq!(keys.len(), groups.len());
        }
    }
}
