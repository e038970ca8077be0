/// Separators tried in order. The first one present in the headline wins,
/// regardless of where it occurs in the string.
const SEPARATORS: &[&str] = &[" at ", " @ ", " | ", " - "];

const SEPARATORS_WITH_COMMA: &[&str] = &[" at ", " @ ", " | ", " - ", ", "];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Occupation {
    pub title: String,
    pub company: String,
}

#[derive(Debug, Clone, Copy)]
pub struct HeadlineParser {
    separators: &'static [&'static str],
}

impl Default for HeadlineParser {
    fn default() -> Self {
        HeadlineParser {
            separators: SEPARATORS,
        }
    }
}

impl HeadlineParser {
    /// Also split on `", "` as a last resort. Off by default because many
    /// titles contain commas ("Engineer, Data").
    pub fn with_comma() -> Self {
        HeadlineParser {
            separators: SEPARATORS_WITH_COMMA,
        }
    }

    pub fn parse(&self, headline: &str) -> Occupation {
        for sep in self.separators {
            if let Some((title, company)) = headline.split_once(sep) {
                return Occupation {
                    title: title.trim().to_string(),
                    company: company.trim().to_string(),
                };
            }
        }

        Occupation {
            title: headline.to_string(),
            company: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn occupation(title: &str, company: &str) -> Occupation {
        Occupation {
            title: title.to_string(),
            company: company.to_string(),
        }
    }

    #[test]
    fn splits_on_at() {
        let p = HeadlineParser::default();
        assert_eq!(
            p.parse("Senior Engineer at Acme Corp"),
            occupation("Senior Engineer", "Acme Corp")
        );
    }

    #[test]
    fn splits_on_pipe() {
        let p = HeadlineParser::default();
        assert_eq!(p.parse("Engineer | Acme"), occupation("Engineer", "Acme"));
    }

    #[test]
    fn no_separator_keeps_whole_headline_as_title() {
        let p = HeadlineParser::default();
        assert_eq!(p.parse("Freelancer"), occupation("Freelancer", ""));
        assert_eq!(p.parse(""), occupation("", ""));
    }

    #[test]
    fn priority_beats_position() {
        let p = HeadlineParser::default();
        // " - " occurs first in the string but " at " has priority
        assert_eq!(
            p.parse("Backend - Payments at Acme"),
            occupation("Backend - Payments", "Acme")
        );
        assert_eq!(
            p.parse("Engineer, Data | Acme"),
            occupation("Engineer, Data", "Acme")
        );
    }

    #[test]
    fn company_keeps_repeated_separator() {
        let p = HeadlineParser::default();
        assert_eq!(
            p.parse("Founder | Acme | Ex-Globex"),
            occupation("Founder", "Acme | Ex-Globex")
        );
    }

    #[test]
    fn comma_only_when_enabled() {
        assert_eq!(
            HeadlineParser::default().parse("Designer, Initech"),
            occupation("Designer, Initech", "")
        );
        assert_eq!(
            HeadlineParser::with_comma().parse("Designer, Initech"),
            occupation("Designer", "Initech")
        );
        assert_eq!(
            HeadlineParser::with_comma().parse("Engineer, Data | Acme"),
            occupation("Engineer, Data", "Acme")
        );
    }
}
