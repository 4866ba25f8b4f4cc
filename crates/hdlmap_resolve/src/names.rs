//! Name tokenization and comparison.

/// Converts a module name to lowercase snake case.
///
/// Word boundaries are inserted at lower-to-upper transitions, digit-to-upper
/// transitions and at the end of an acronym (`CPUCore` -> `cpu_core`). Any
/// non-alphanumeric run becomes a single underscore. Digits stay attached to
/// the preceding word (`top2`, `rv32`).
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Lowercases, drops non-alphanumerics and strips the first matching
/// prefix, unless that would leave nothing.
pub fn normalize(name: &str, strip_prefixes: &[String]) -> String {
    let flat: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    for prefix in strip_prefixes {
        let prefix = prefix.to_ascii_lowercase();
        if let Some(rest) = flat.strip_prefix(prefix.as_str()) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    flat
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Normalized Levenshtein similarity in `[0, 1]`; two empty strings are
/// identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_boundaries() {
        assert_eq!(snake_case("RiscVCore"), "risc_v_core");
        assert_eq!(snake_case("mkCPU"), "mk_cpu");
        assert_eq!(snake_case("CPUCore"), "cpu_core");
        assert_eq!(snake_case("PicoRV32"), "pico_rv32");
        assert_eq!(snake_case("RV32Core"), "rv32_core");
        assert_eq!(snake_case("core_top"), "core_top");
        assert_eq!(snake_case("top2"), "top2");
        assert_eq!(snake_case("__uart__tx"), "uart_tx");
        assert_eq!(snake_case("ALU"), "alu");
    }

    #[test]
    fn normalize_strips_prefix() {
        let mk = vec!["mk".to_string()];
        assert_eq!(normalize("mkFlute_Core", &mk), "flutecore");
        assert_eq!(normalize("mk", &mk), "mk");
        assert_eq!(normalize("Pico-RV32", &[]), "picorv32");
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert!((similarity("picorv32", "picorv") - 0.75).abs() < 1e-9);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
