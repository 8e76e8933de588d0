use std::collections::HashSet;

use anyhow::{Context, Result, bail};

const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_LEN: u64 = 10_000;

/// Resolve a list of CLI seed arguments into session seeds.
///
/// Supports decimal integers (negative values use their magnitude), `0x`
/// hexadecimal, and half-open ranges such as `10..20` of at most
/// `MAX_RANGE_LEN` seeds. Duplicates are dropped keeping the first occurrence.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let resolved: Vec<u64> = if let Some((start, end)) = token.split_once("..") {
            let start = parse_seed(start).with_context(|| format!("bad range start in {token}"))?;
            let end = parse_seed(end).with_context(|| format!("bad range end in {token}"))?;
            if end <= start {
                bail!("Empty seed range: {token}");
            }
            if end - start > MAX_RANGE_LEN {
                bail!("Seed range {token} is longer than {MAX_RANGE_LEN} seeds");
            }
            (start..end).collect()
        } else {
            vec![parse_seed(token)?]
        };

        for seed in resolved {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

fn parse_seed(token: &str) -> Result<u64> {
    let token = token.trim();
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(&hex.replace('_', ""), 16)
            .with_context(|| format!("Unrecognized seed token: {token}"));
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    bail!("Unrecognized seed token: {token}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_hex_and_ranges() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xFF", "3..6", "4"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 255, 3, 4, 5]);
    }

    #[test]
    fn defaults_when_empty() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
        assert_eq!(resolve_seed_inputs(&tokens(&["", " "])).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(resolve_seed_inputs(&tokens(&["copenhagen"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9..2"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
    }

    #[test]
    fn caps_range_length() {
        let err = resolve_seed_inputs(&tokens(&["0..18446744073709551615"])).unwrap_err();
        assert!(err.to_string().contains("longer than"));
        let seeds = resolve_seed_inputs(&tokens(&["0..10000", "5"])).unwrap();
        assert_eq!(seeds.len(), 10_000);
        assert_eq!(seeds.last(), Some(&9_999));
    }
}
