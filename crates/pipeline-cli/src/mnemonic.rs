//! Case-insensitive mnemonic resolution against the core operator table.

use pipeline_core::{Operator, OPERATOR_TABLE};

/// Resolves a mnemonic in any letter case.
#[must_use]
pub fn resolve_mnemonic(token: &str) -> Option<Operator> {
    Operator::from_mnemonic(&token.to_ascii_uppercase())
}

/// All accepted mnemonics in table order.
pub fn mnemonics() -> impl Iterator<Item = &'static str> {
    OPERATOR_TABLE.iter().map(|info| info.mnemonic)
}

#[cfg(test)]
mod tests {
    use super::{mnemonics, resolve_mnemonic};
    use pipeline_core::Operator;

    #[test]
    fn resolution_ignores_case() {
        assert_eq!(resolve_mnemonic("mul.d"), Some(Operator::FpMultiply));
        assert_eq!(resolve_mnemonic("Beq"), Some(Operator::BranchEqual));
        assert_eq!(resolve_mnemonic("L.D"), Some(Operator::LoadFp));
    }

    #[test]
    fn unknown_tokens_do_not_resolve() {
        assert_eq!(resolve_mnemonic("MULT"), None);
        assert_eq!(resolve_mnemonic(""), None);
        assert_eq!(resolve_mnemonic("ADD.S"), None);
    }

    #[test]
    fn every_mnemonic_round_trips() {
        let names: Vec<_> = mnemonics().collect();
        assert_eq!(names.len(), 15);
        for name in names {
            let operator = resolve_mnemonic(name).expect("table mnemonic");
            assert_eq!(operator.mnemonic(), name);
        }
    }
}
