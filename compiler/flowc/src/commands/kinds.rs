//! The `kinds` command: list the built-in node catalog.

use flow_compile::{Catalog, NodeKind, PortSpec, Repr};

/// Print every built-in node kind with its ports, sorted by name.
pub fn list_kinds() {
    let catalog = Catalog::builtin();
    for name in catalog.names() {
        if let Some(kind) = catalog.get(name) {
            println!("{}", describe(kind));
        }
    }
}

/// One line per kind: `name (inputs) -> (outputs)`.
fn describe(kind: &dyn NodeKind) -> String {
    format!(
        "{} ({}) -> ({})",
        kind.name(),
        ports(kind.inputs()),
        ports(kind.outputs())
    )
}

fn ports(specs: &[PortSpec]) -> String {
    specs
        .iter()
        .map(|spec| match spec.repr {
            Repr::Native => format!("{}: {}", spec.name, spec.kind),
            Repr::Boxed => format!("{}: boxed {}", spec.name, spec.kind),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "builtin kinds are always present")]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn describes_ports_in_order() {
        let catalog = Catalog::builtin();
        assert_eq!(
            describe(catalog.get("if").unwrap()),
            "if (in: signal, condition: condition) -> (then: signal, else: signal)"
        );
        assert_eq!(
            describe(catalog.get("get_variable:text").unwrap()),
            "get_variable:text () -> (value: boxed text)"
        );
        assert_eq!(describe(catalog.get("start").unwrap()), "start () -> (next: signal)");
    }
}
