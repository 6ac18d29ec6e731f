//! Serialises per-stream filter requests into filter graph arguments.

/// Directive for complex filter graphs with labelled inputs.
pub const FILTER_COMPLEX: &str = "-filter_complex";
/// Directive for the simple audio filter graph.
pub const AUDIO_FILTER: &str = "-filter:a";

/// Filters requested by one stream under one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfiguration {
    /// `-filter_complex`, `-filter:a`, ...
    pub directive: String,
    /// Label used for the stream inside a complex graph.
    pub stream_number: usize,
    /// Filter name → value, in insertion order. Empty values render bare.
    pub filters: Vec<(String, String)>,
}

/// Groups configurations by directive and renders each group.
///
/// Groups appear in the order their directive is first seen; inside a group
/// configurations keep their input order. Only `-filter_complex` entries get a
/// `[n]` label, since simple graphs take exactly one unlabelled input.
pub fn assemble_filters(configurations: &[FilterConfiguration]) -> String {
    let mut directives: Vec<&str> = Vec::new();
    for configuration in configurations {
        if !directives.contains(&configuration.directive.as_str()) {
            directives.push(&configuration.directive);
        }
    }

    let mut output = String::new();
    for directive in directives {
        let labelled = directive == FILTER_COMPLEX;
        let values: Vec<String> = configurations
            .iter()
            .filter(|c| c.directive == directive)
            .flat_map(|c| {
                c.filters.iter().map(move |(key, value)| {
                    let filter = if value.is_empty() {
                        format!("{} ", key)
                    } else {
                        format!("{}={} ", key, value)
                    };
                    if labelled {
                        format!("[{}] {}", c.stream_number, filter)
                    } else {
                        filter
                    }
                })
            })
            .collect();

        if values.is_empty() {
            continue;
        }
        output.push_str(&format!("{} \"{}\" ", directive, values.join(";")));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(directive: &str, stream: usize, filters: &[(&str, &str)]) -> FilterConfiguration {
        FilterConfiguration {
            directive: directive.to_string(),
            stream_number: stream,
            filters: filters
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert_eq!(assemble_filters(&[]), "");
    }

    #[test]
    fn test_complex_filters_are_labelled() {
        let rendered = assemble_filters(&[config(
            FILTER_COMPLEX,
            0,
            &[("setpts", "0.5*PTS"), ("reverse", "")],
        )]);
        assert_eq!(
            rendered,
            "-filter_complex \"[0] setpts=0.5*PTS ;[0] reverse \" "
        );
    }

    #[test]
    fn test_groups_by_directive_in_first_seen_order() {
        let rendered = assemble_filters(&[
            config(AUDIO_FILTER, 1, &[("atempo", "1.5")]),
            config(FILTER_COMPLEX, 0, &[("setpts", "0.6667*PTS")]),
            config(AUDIO_FILTER, 2, &[("areverse", "")]),
        ]);
        assert_eq!(
            rendered,
            "-filter:a \"atempo=1.5 ;areverse \" -filter_complex \"[0] setpts=0.6667*PTS \" "
        );
    }
}
