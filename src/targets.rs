//! Browser target resolution.
//!
//! Maps a browserslist-style query list onto the highest ECMAScript edition every
//! listed environment can parse. This is a table lookup; it does not consult
//! usage statistics, so share-based queries (`> 0.5%`, `last 2 versions`) are
//! rejected as unknown.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{CheckError, Result};
use crate::version::EcmaVersion;

lazy_static! {
    /// Minimum browser version that ships the full syntax of each edition, from
    /// ES2015 through ES2024. ES5 needs no entry.
    static ref SUPPORT_TABLE: HashMap<&'static str, [f64; 10]> = {
        let mut m = HashMap::new();
        //                     2015  2016  2017  2018  2019  2020  2021  2022  2023  2024
        m.insert("chrome",    [51.0, 52.0, 58.0, 64.0, 73.0, 80.0, 85.0, 94.0, 94.0, 112.0]);
        m.insert("edge",      [15.0, 15.0, 16.0, 79.0, 79.0, 80.0, 85.0, 94.0, 94.0, 112.0]);
        m.insert("firefox",   [54.0, 54.0, 53.0, 78.0, 78.0, 80.0, 80.0, 93.0, 93.0, 116.0]);
        m.insert("safari",    [10.0, 10.1, 11.0, 16.4, 16.4, 16.4, 16.4, 16.4, 16.4, 17.0]);
        m.insert("ios_saf",   [10.0, 10.3, 11.0, 16.4, 16.4, 16.4, 16.4, 16.4, 16.4, 17.0]);
        m.insert("opera",     [38.0, 39.0, 45.0, 51.0, 60.0, 67.0, 71.0, 80.0, 80.0, 98.0]);
        m.insert("samsung",   [5.0, 6.0, 7.0, 9.0, 11.0, 13.0, 14.0, 17.0, 17.0, 23.0]);
        m.insert("node",      [6.5, 7.0, 8.0, 10.0, 12.0, 14.0, 15.0, 16.11, 16.11, 20.0]);
        m
    };

    static ref ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("ios", "ios_saf");
        m.insert("chromeandroid", "chrome");
        m.insert("and_chr", "chrome");
        m.insert("firefoxandroid", "firefox");
        m.insert("and_ff", "firefox");
        m.insert("samsunginternet", "samsung");
        m.insert("explorer", "ie");
        m
    };

    /// `"chrome >= 53"`, `"safari > 10"`, `"ie 11"`.
    static ref QUERY_RE: Regex =
        Regex::new(r"^(?i)([a-z_]+)\s*(>=|>)?\s*(\d+(?:\.\d+)?)$").unwrap();

    /// Versions that first shipped `<script type="module">`.
    static ref ES6_MODULE_BROWSERS: Vec<(&'static str, f64)> = vec![
        ("chrome", 61.0),
        ("edge", 16.0),
        ("firefox", 60.0),
        ("safari", 11.0),
        ("ios_saf", 11.0),
        ("opera", 48.0),
        ("samsung", 8.2),
    ];
}

/// Resolve a whole target list to the lowest edition shared by all entries.
pub fn resolve_targets(targets: &[String]) -> Result<EcmaVersion> {
    let mut lowest: Option<EcmaVersion> = None;
    for query in targets {
        let version = resolve_query(query)?;
        lowest = Some(lowest.map_or(version, |v| v.min(version)));
    }
    lowest.ok_or(CheckError::MissingTarget)
}

fn resolve_query(query: &str) -> Result<EcmaVersion> {
    let trimmed = query.trim();
    let lower = trimmed.to_ascii_lowercase();

    if lower == "fully supports es6-module" || lower == "supports es6-module" {
        return Ok(ES6_MODULE_BROWSERS
            .iter()
            .map(|(browser, version)| edition_for(browser, *version))
            .min()
            .unwrap_or(EcmaVersion::Es5));
    }

    let caps = QUERY_RE
        .captures(trimmed)
        .ok_or_else(|| CheckError::UnknownTarget(query.to_string()))?;
    let name = caps[1].to_ascii_lowercase();
    let browser = ALIASES.get(name.as_str()).copied().unwrap_or(name.as_str());
    let mut version: f64 = caps[3]
        .parse()
        .map_err(|_| CheckError::UnknownTarget(query.to_string()))?;

    if browser == "ie" {
        return Ok(EcmaVersion::Es5);
    }
    if !SUPPORT_TABLE.contains_key(browser) {
        return Err(CheckError::UnknownTarget(query.to_string()));
    }
    if caps.get(2).map(|m| m.as_str()) == Some(">") {
        version = next_release(browser, version);
    }
    Ok(edition_for(browser, version))
}

/// First release after `version`: the next major, or a tabled minor release
/// in between (`safari > 10` starts at 10.1).
fn next_release(browser: &str, version: f64) -> f64 {
    let next_major = version.floor() + 1.0;
    SUPPORT_TABLE
        .get(browser)
        .into_iter()
        .flat_map(|row| row.iter().copied())
        .filter(|min| *min > version + f64::EPSILON)
        .fold(next_major, f64::min)
}

/// Highest edition whose requirements, and those of every earlier edition, the
/// given browser version meets.
fn edition_for(browser: &str, version: f64) -> EcmaVersion {
    let Some(row) = SUPPORT_TABLE.get(browser) else {
        return EcmaVersion::Es5;
    };
    let mut edition = EcmaVersion::Es5;
    for (idx, min) in row.iter().enumerate() {
        if version + f64::EPSILON < *min {
            break;
        }
        match EcmaVersion::from_year(2015 + idx as u32) {
            Some(next) => edition = next,
            None => break,
        }
    }
    edition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_browser_queries() {
        assert_eq!(
            resolve_targets(&targets(&["chrome >= 53"])).unwrap(),
            EcmaVersion::Es2016
        );
        assert_eq!(
            resolve_targets(&targets(&["chrome >= 80"])).unwrap(),
            EcmaVersion::Es2020
        );
        assert_eq!(
            resolve_targets(&targets(&["ie 11"])).unwrap(),
            EcmaVersion::Es5
        );
    }

    #[test]
    fn test_greater_than_steps_to_next_release() {
        assert_eq!(
            resolve_targets(&targets(&["safari > 10"])).unwrap(),
            EcmaVersion::Es2016
        );
        assert_eq!(
            resolve_targets(&targets(&["safari >= 10"])).unwrap(),
            EcmaVersion::Es2015
        );
        assert_eq!(
            resolve_targets(&targets(&["chrome > 51"])).unwrap(),
            EcmaVersion::Es2016
        );
        assert_eq!(
            resolve_targets(&targets(&["chrome > 52"])).unwrap(),
            EcmaVersion::Es2016
        );
        assert_eq!(
            resolve_targets(&targets(&["ios_saf > 10.2"])).unwrap(),
            EcmaVersion::Es2016
        );
    }

    #[test]
    fn test_list_takes_lowest() {
        let version = resolve_targets(&targets(&["chrome >= 100", "safari >= 12"])).unwrap();
        assert_eq!(version, EcmaVersion::Es2017);
    }

    #[test]
    fn test_es6_module_query_predates_optional_chaining() {
        let version = resolve_targets(&targets(&["fully supports es6-module"])).unwrap();
        assert!(version < EcmaVersion::Es2020);
        assert!(version >= EcmaVersion::Es2015);
    }

    #[test]
    fn test_unknown_and_empty() {
        assert!(matches!(
            resolve_targets(&targets(&["> 0.5%"])),
            Err(CheckError::UnknownTarget(_))
        ));
        assert!(matches!(
            resolve_targets(&[]),
            Err(CheckError::MissingTarget)
        ));
    }
}
