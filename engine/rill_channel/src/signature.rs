//! Member descriptors.

use std::fmt;

use rill_value::ContentKind;

/// Describes one resolvable member: its name, result kind, and parameter
/// kinds. Used for introspection and for building actionable
/// "member not found" diagnostics.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Signature {
    pub name: String,
    pub result: ContentKind,
    pub params: Vec<ContentKind>,
}

impl Signature {
    pub fn property(name: impl Into<String>, result: ContentKind) -> Self {
        Signature {
            name: name.into(),
            result,
            params: Vec::new(),
        }
    }

    pub fn method(
        name: impl Into<String>,
        result: ContentKind,
        params: Vec<ContentKind>,
    ) -> Self {
        Signature {
            name: name.into(),
            result,
            params,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}: {}", self.name, self.result)
        } else {
            let params: Vec<&str> = self.params.iter().map(|p| p.name()).collect();
            write!(f, "{}({}): {}", self.name, params.join(", "), self.result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_reads_like_a_declaration() {
        assert_eq!(
            Signature::property("total", ContentKind::Decimal).to_string(),
            "total: decimal"
        );
        assert_eq!(
            Signature::method("slice", ContentKind::List, vec![ContentKind::Int]).to_string(),
            "slice(int): list"
        );
    }
}
