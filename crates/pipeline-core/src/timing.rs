use crate::operator::{ExecClass, Operator};

/// Cycles spent in `IF` and `ID` by every instruction.
pub const FRONT_END_CYCLES: u16 = 2;

/// Execute-phase length per class: `EX` or the depth of the floating-point unit.
pub const EXECUTE_CYCLES_TABLE: &[(ExecClass, u16)] = &[
    (ExecClass::IntegerMemory, 1),
    (ExecClass::FpAdd, 2),
    (ExecClass::FpMultiply, 10),
    (ExecClass::FpDivide, 40),
    (ExecClass::Branch, 1),
];

/// Looks up the execute-phase length for a class.
#[must_use]
pub fn execute_cycles(class: ExecClass) -> Option<u16> {
    EXECUTE_CYCLES_TABLE
        .iter()
        .find_map(|(entry_class, cycles)| (*entry_class == class).then_some(*cycles))
}

/// Pipeline occupancy of `operator` when nothing ahead of it contends for a unit.
///
/// Branches leave after `EX`; everything else spends its memory cycles and one
/// write-back cycle.
#[must_use]
pub fn uncontended_cycles(operator: Operator) -> u16 {
    let execute = execute_cycles(operator.class()).unwrap_or(1);
    let write_back = u16::from(!operator.is_branch());
    FRONT_END_CYCLES + execute + u16::from(operator.memory_cycles()) + write_back
}
