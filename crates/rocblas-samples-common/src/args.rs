//! Letter-keyed sample options.
//!
//! Each sample names the options it understands with a short letter string
//! such as `"axyn"`. The letters index [`ARG_TABLE`], which supplies the
//! long name, help text and value kind for every option; [`command_args`]
//! turns a letter string into `clap` arguments and
//! [`SampleArgs::from_matches`] reads them back.

use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, value_parser};

/// What kind of value an option carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Vector length. Any integer; samples reject `n <= 0` themselves.
    Length,
    /// Vector increment. Negative values walk the vector backwards.
    Increment,
    /// Matrix dimension, `>= 0`.
    Dimension,
    /// Floating-point scalar.
    Scalar,
    /// Batch count, `>= 0`.
    Count,
}

/// One entry of the option table.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub letter: char,
    pub long: &'static str,
    pub help: &'static str,
    pub kind: ArgKind,
}

/// Every option a sample can request.
pub const ARG_TABLE: &[ArgSpec] = &[
    ArgSpec { letter: 'n', long: "n", help: "Size of vector", kind: ArgKind::Length },
    ArgSpec { letter: 'x', long: "incx", help: "Increment for x vector", kind: ArgKind::Increment },
    ArgSpec { letter: 'y', long: "incy", help: "Increment for y vector", kind: ArgKind::Increment },
    ArgSpec { letter: 'M', long: "M", help: "Matrix/vector dimension", kind: ArgKind::Dimension },
    ArgSpec { letter: 'N', long: "N", help: "Matrix/vector dimension", kind: ArgKind::Dimension },
    ArgSpec { letter: 'K', long: "K", help: "Matrix/vector dimension", kind: ArgKind::Dimension },
    ArgSpec { letter: 'a', long: "alpha", help: "Alpha scalar", kind: ArgKind::Scalar },
    ArgSpec { letter: 'b', long: "beta", help: "Beta scalar", kind: ArgKind::Scalar },
    ArgSpec { letter: 'c', long: "count", help: "Batch count", kind: ArgKind::Count },
];

/// Look up a table entry by letter.
pub fn lookup(letter: char) -> Option<&'static ArgSpec> {
    ARG_TABLE.iter().find(|spec| spec.letter == letter)
}

/// Parsed option values. Options a sample did not request keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleArgs {
    /// `n`: vector length.
    pub vector_len: i32,
    pub incx: i32,
    pub incy: i32,
    pub m: i32,
    pub n: i32,
    pub k: i32,
    pub alpha: f32,
    pub beta: f32,
    pub batch_count: i32,
}

impl Default for SampleArgs {
    fn default() -> Self {
        Self {
            vector_len: 5,
            incx: 1,
            incy: 1,
            m: 5,
            n: 5,
            k: 5,
            alpha: 1.0,
            beta: 1.0,
            batch_count: 3,
        }
    }
}

impl SampleArgs {
    fn default_text(&self, letter: char) -> String {
        match letter {
            'n' => self.vector_len.to_string(),
            'x' => self.incx.to_string(),
            'y' => self.incy.to_string(),
            'M' => self.m.to_string(),
            'N' => self.n.to_string(),
            'K' => self.k.to_string(),
            'a' => self.alpha.to_string(),
            'b' => self.beta.to_string(),
            _ => self.batch_count.to_string(),
        }
    }

    /// Read the options named by `letters` out of `matches`, starting from `defaults`.
    pub fn from_matches(letters: &str, matches: &ArgMatches, defaults: &SampleArgs) -> Result<Self> {
        let mut args = *defaults;
        for letter in letters.chars() {
            let Some(spec) = lookup(letter) else {
                bail!("unknown option letter '{letter}'");
            };
            match spec.kind {
                ArgKind::Scalar => {
                    let Some(&value) = matches.get_one::<f32>(spec.long) else { continue };
                    match letter {
                        'a' => args.alpha = value,
                        _ => args.beta = value,
                    }
                }
                _ => {
                    let Some(&value) = matches.get_one::<i32>(spec.long) else { continue };
                    match letter {
                        'n' => args.vector_len = value,
                        'x' => args.incx = value,
                        'y' => args.incy = value,
                        'M' => args.m = value,
                        'N' => args.n = value,
                        'K' => args.k = value,
                        _ => args.batch_count = value,
                    }
                }
            }
        }
        Ok(args)
    }
}

/// Validate a letter string: known letters, no repeats.
pub fn validate_letters(letters: &str) -> Result<()> {
    let mut seen = Vec::with_capacity(letters.len());
    for letter in letters.chars() {
        if lookup(letter).is_none() {
            bail!("unknown option letter '{letter}'");
        }
        if seen.contains(&letter) {
            bail!("option letter '{letter}' listed twice");
        }
        seen.push(letter);
    }
    Ok(())
}

/// Build the `clap` arguments for `letters`, showing `defaults` in help.
///
/// Both `-x 2` and `--incx 2` are accepted.
pub fn command_args(letters: &str, defaults: &SampleArgs) -> Result<Vec<Arg>> {
    validate_letters(letters)?;
    let args = letters
        .chars()
        .filter_map(lookup)
        .map(|spec| {
            let arg = Arg::new(spec.long)
                .long(spec.long)
                .short(spec.letter)
                .value_name("VALUE")
                .help(spec.help)
                .action(ArgAction::Set)
                .default_value(defaults.default_text(spec.letter));
            match spec.kind {
                ArgKind::Length | ArgKind::Increment => {
                    arg.value_parser(value_parser!(i32)).allow_negative_numbers(true)
                }
                ArgKind::Dimension | ArgKind::Count => {
                    arg.value_parser(value_parser!(i32).range(0..))
                }
                ArgKind::Scalar => arg.value_parser(value_parser!(f32)).allow_negative_numbers(true),
            }
        })
        .collect();
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn parse(letters: &str, defaults: SampleArgs, argv: &[&str]) -> Result<SampleArgs> {
        let cmd = Command::new("sample").args(command_args(letters, &defaults)?);
        let matches = cmd.try_get_matches_from(std::iter::once("sample").chain(argv.iter().copied()))?;
        SampleArgs::from_matches(letters, &matches, &defaults)
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let args = parse("axyn", SampleArgs::default(), &[]).unwrap();
        assert_eq!(args, SampleArgs::default());
    }

    #[test]
    fn long_and_short_forms_are_equivalent() {
        let long = parse("axyn", SampleArgs::default(), &["--n", "100", "--incx", "2"]).unwrap();
        let short = parse("axyn", SampleArgs::default(), &["-n", "100", "-x", "2"]).unwrap();
        assert_eq!(long, short);
        assert_eq!(long.vector_len, 100);
        assert_eq!(long.incx, 2);
    }

    #[test]
    fn upper_and_lower_case_letters_are_distinct() {
        let args = parse("nN", SampleArgs::default(), &["-n", "7", "-N", "9"]).unwrap();
        assert_eq!(args.vector_len, 7);
        assert_eq!(args.n, 9);
    }

    #[test]
    fn negative_increment_and_alpha_are_accepted() {
        let args = parse("axn", SampleArgs::default(), &["-x", "-2", "--alpha", "-0.5"]).unwrap();
        assert_eq!(args.incx, -2);
        assert_eq!(args.alpha, -0.5);
    }

    #[test]
    fn sample_defaults_override_table_defaults() {
        let defaults = SampleArgs { m: 200, n: 60, k: 200, ..SampleArgs::default() };
        let args = parse("MNKab", defaults, &["-N", "8"]).unwrap();
        assert_eq!((args.m, args.n, args.k), (200, 8, 200));
    }

    #[test]
    fn options_outside_the_letter_set_are_rejected() {
        assert!(parse("xn", SampleArgs::default(), &["--alpha", "2"]).is_err());
        assert!(parse("MN", SampleArgs::default(), &["-M", "-3"]).is_err());
        assert!(parse("n", SampleArgs::default(), &["-n", "abc"]).is_err());
    }

    #[test]
    fn bad_letter_strings_are_rejected() {
        assert!(validate_letters("axyz").is_err());
        assert!(validate_letters("aa").is_err());
        assert!(validate_letters("MNKabcnxy").is_ok());
    }
}
