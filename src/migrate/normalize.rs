//! Input normalization.
//!
//! BOM and CRLF are normalized to LF before the pipeline sees a file.
//! Binary files are detected and skipped. Structural oddities (unbalanced
//! quotes or brackets, lossy decoding) become issue entries, never
//! failures.

/// How much of a file the binary sniff inspects.
const SNIFF_BYTES: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub content: String,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Text(Normalized),
    Binary,
}

pub fn normalize(bytes: &[u8]) -> NormalizeOutcome {
    if bytes[..bytes.len().min(SNIFF_BYTES)].contains(&0) {
        return NormalizeOutcome::Binary;
    }

    let mut issues = Vec::new();
    let decoded = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            issues.push("invalid UTF-8 sequences replaced".to_string());
            String::from_utf8_lossy(bytes).into_owned()
        }
    };

    let mut content = decoded;
    if let Some(stripped) = content.strip_prefix('\u{feff}') {
        content = stripped.to_string();
    }
    if content.contains('\r') {
        content = content.replace("\r\n", "\n").replace('\r', "\n");
    }

    check_balance(&content, &mut issues);
    NormalizeOutcome::Text(Normalized { content, issues })
}

/// Quote parity per line and overall bracket balance, both advisory.
fn check_balance(content: &str, issues: &mut Vec<String>) {
    let mut round = 0i64;
    let mut square = 0i64;
    let mut curly = 0i64;
    for (index, line) in content.lines().enumerate() {
        let mut singles = 0usize;
        let mut doubles = 0usize;
        let mut escaped = false;
        for c in line.chars() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '\'' => singles += 1,
                '"' => doubles += 1,
                '(' => round += 1,
                ')' => round -= 1,
                '[' => square += 1,
                ']' => square -= 1,
                '{' => curly += 1,
                '}' => curly -= 1,
                _ => {}
            }
        }
        if singles % 2 == 1 && doubles % 2 == 1 {
            issues.push(format!("unbalanced quotes on line {}", index + 1));
        }
    }
    if round != 0 || square != 0 || curly != 0 {
        issues.push("unbalanced brackets in file".to_string());
    }
}
