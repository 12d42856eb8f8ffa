//! Branch resolution: taken/not-taken and the next instruction index.

use crate::operator::Operator;
use crate::program::{Instruction, Operand, Program};
use crate::state::ArchitecturalState;
use crate::SimError;

/// Decides whether `instruction` transfers control.
///
/// `J` is always taken, `BEQ`/`BNE` compare two integer registers and every
/// other operator falls through.
///
/// # Errors
///
/// Returns [`SimError::MalformedOperands`] when a conditional branch does not
/// carry two integer registers.
pub fn branch_taken(
    instruction: &Instruction,
    state: &ArchitecturalState,
) -> Result<bool, SimError> {
    let operator = instruction.operator();
    match (operator, instruction.operands()) {
        (Operator::Jump, _) => Ok(true),
        (
            Operator::BranchEqual | Operator::BranchNotEqual,
            [Operand::IntRegister(lhs), Operand::IntRegister(rhs), ..],
        ) => {
            let equal = state.int(*lhs) == state.int(*rhs);
            Ok(equal == (operator == Operator::BranchEqual))
        }
        (Operator::BranchEqual | Operator::BranchNotEqual, _) => {
            Err(SimError::MalformedOperands { operator })
        }
        _ => Ok(false),
    }
}

/// Index issued after `index`.
///
/// A taken branch goes to the nearest label at or before the branch itself.
#[must_use]
pub fn next_index(program: &Program, index: usize, taken: bool) -> usize {
    if taken {
        program.label_at_or_before(index)
    } else {
        index + 1
    }
}
