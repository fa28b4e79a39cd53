//! Plain-text dumps of host buffers.

use std::fmt::{Display, Write};

/// Every `inc`-th element of the first `n` (all of `v` when `n == 0`),
/// space separated, stopping after `limit` values.
pub fn format_vector<T: Display>(v: &[T], n: usize, inc: usize, limit: usize) -> String {
    let n = if n == 0 { v.len() } else { n.min(v.len()) };
    let mut out = String::new();
    let mut shown = 0;
    for x in v[..n].iter().step_by(inc.max(1)) {
        if shown == limit {
            out.push_str("...");
            return out;
        }
        let _ = write!(out, "{x} ");
        shown += 1;
    }
    out.trim_end().to_string()
}

pub fn print_vector<T: Display>(v: &[T], n: usize, inc: usize, limit: usize) {
    println!("{}", format_vector(v, n, inc, limit));
}

/// An `m × n` column-major matrix, one row per line, under a banner with
/// `name`. At most `limit` rows and columns are shown.
pub fn format_matrix<T: Display>(
    name: &str,
    a: &[T],
    m: usize,
    n: usize,
    lda: usize,
    limit: usize,
) -> String {
    let mut out = format!("---------- {name} ----------\n");
    for i in 0..m.min(limit) {
        for j in 0..n.min(limit) {
            let _ = write!(out, "{:>10.4} ", a[i + j * lda]);
        }
        if n > limit {
            out.push_str("...");
        }
        out.push('\n');
    }
    if m > limit {
        out.push_str("...\n");
    }
    out
}

pub fn print_matrix<T: Display>(name: &str, a: &[T], m: usize, n: usize, lda: usize, limit: usize) {
    print!("{}", format_matrix(name, a, m, n, lda, limit));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_respects_increment_and_limit() {
        let v = [1, 2, 3, 4, 5, 6];
        assert_eq!(format_vector(&v, 0, 2, 10), "1 3 5");
        assert_eq!(format_vector(&v, 4, 1, 10), "1 2 3 4");
        assert_eq!(format_vector(&v, 0, 1, 2), "1 2 ...");
    }

    #[test]
    fn matrix_is_printed_row_by_row() {
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let text = format_matrix("A", &a, 2, 2, 2, 8);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "---------- A ----------");
        assert_eq!(lines[1].split_whitespace().collect::<Vec<_>>(), ["1.0000", "3.0000"]);
        assert_eq!(lines[2].split_whitespace().collect::<Vec<_>>(), ["2.0000", "4.0000"]);
    }

    #[test]
    fn large_matrix_is_truncated() {
        let a = vec![0i32; 100];
        let text = format_matrix("Z", &a, 10, 10, 10, 3);
        assert_eq!(text.lines().count(), 1 + 3 + 1);
        assert!(text.lines().nth(1).is_some_and(|l| l.ends_with("...")));
    }
}
