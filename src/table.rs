//! This module defines the `TransitionTable`, the dense per-(state, symbol) lookup the
//! execution engine consumes, and the `TableBuilder` that assembles one from the text of an
//! instruction set.
//!
//! The format is line oriented:
//!
//! ```text
//! STATES: 2
//! 0,0->0,0,R
//! 0,1->1,1,R
//! 1,0->1,1,RSTOP
//! 1,1->1,1,R
//! ```
//!
//! Under [`SlotOrder::LineOrder`] the Nth data line fills slot `(N / 2, N % 2)`, whatever
//! its own left-hand side says. Slots without a line keep [`Transition::fallback`].

use crate::parser::{parse_header, parse_instruction};
use crate::types::{Bit, SlotOrder, TapeMachineError, Transition, MIN_INSTRUCTION_LEN};
use tracing::{debug, warn};

/// A total mapping from `(state, symbol)` to [`Transition`], immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    max_states: usize,
    // Two entries per state: `[state * 2]` for `0`, `[state * 2 + 1]` for `1`.
    entries: Vec<Transition>,
}

impl TransitionTable {
    /// Creates a table whose every slot holds the fallback transition.
    pub fn with_defaults(max_states: usize) -> Self {
        let entries = (0..max_states)
            .flat_map(|state| {
                [Bit::Zero, Bit::One]
                    .into_iter()
                    .map(move |symbol| Transition::fallback(state, symbol))
            })
            .collect();

        Self {
            max_states,
            entries,
        }
    }

    /// The number of states declared by the instruction set.
    pub fn max_states(&self) -> usize {
        self.max_states
    }

    /// Total number of slots, always `2 * max_states`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the transition for `state` reading `symbol`.
    ///
    /// # Returns
    ///
    /// * `Ok(&Transition)` for any `state < max_states`.
    /// * `Err(TapeMachineError::InvalidState)` otherwise.
    pub fn lookup(&self, state: usize, symbol: Bit) -> Result<&Transition, TapeMachineError> {
        self.entries
            .get(state * 2 + symbol.index())
            .ok_or(TapeMachineError::InvalidState {
                state,
                max_states: self.max_states,
            })
    }

    /// Iterates over `((state, symbol), transition)` in slot order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, Bit), &Transition)> {
        self.entries.iter().enumerate().map(|(slot, t)| {
            let symbol = if slot % 2 == 0 { Bit::Zero } else { Bit::One };
            ((slot / 2, symbol), t)
        })
    }

    /// Whether any slot holds a halting transition.
    pub fn can_halt(&self) -> bool {
        self.entries.iter().any(|t| t.halt)
    }

    fn set(&mut self, slot: usize, transition: Transition) {
        if let Some(entry) = self.entries.get_mut(slot) {
            *entry = transition;
        }
    }
}

/// Builds a [`TransitionTable`] from instruction-set text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableBuilder {
    slot_order: SlotOrder,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects how transition lines are matched to slots.
    pub fn slot_order(mut self, slot_order: SlotOrder) -> Self {
        self.slot_order = slot_order;
        self
    }

    /// Parses `source` into a fully populated table.
    ///
    /// Fewer than `2N` data lines is fine; anything after line `2N + 1` is ignored with a
    /// warning.
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionTable)` with exactly `2N` entries.
    /// * `Err(TapeMachineError::InstructionFormat)` naming the first offending line.
    pub fn build(&self, source: &str) -> Result<TransitionTable, TapeMachineError> {
        let mut lines = source.lines().map(|line| line.trim_end_matches('\r'));

        let header = lines.next().unwrap_or_default();
        let max_states = parse_header(header).map_err(|e| at_line(1, header, e))?;
        let mut table = TransitionTable::with_defaults(max_states);
        let slots = table.len();

        for (n, line) in lines.by_ref().take(slots).enumerate() {
            let line_no = n + 2;
            if line.len() < MIN_INSTRUCTION_LEN {
                return Err(TapeMachineError::InstructionFormat {
                    line: line_no,
                    content: line.to_string(),
                    reason: format!(
                        "instructions are at least {MIN_INSTRUCTION_LEN} characters long"
                    ),
                });
            }

            let parsed =
                parse_instruction(line, max_states).map_err(|e| at_line(line_no, line, e))?;
            let slot = match self.slot_order {
                SlotOrder::LineOrder => n,
                SlotOrder::Declared => parsed.state * 2 + parsed.symbol.index(),
            };

            debug!(
                "Loading operation {} to state {} and bit {}",
                parsed.transition,
                slot / 2,
                slot % 2
            );
            table.set(slot, parsed.transition);
        }

        if lines.next().is_some() {
            warn!("Ignoring instruction set content from line {}", slots + 2);
        }

        Ok(table)
    }
}

/// Parses `source` with the default line-order slot assignment.
pub fn build(source: &str) -> Result<TransitionTable, TapeMachineError> {
    TableBuilder::new().build(source)
}

/// Attaches a line number to a parse failure.
fn at_line(line: usize, content: &str, error: TapeMachineError) -> TapeMachineError {
    let reason = match error {
        TapeMachineError::Grammar(e) => e.variant.message().into_owned(),
        TapeMachineError::InstructionFormat { reason, .. } => reason,
        other => return other,
    };

    TapeMachineError::InstructionFormat {
        line,
        content: content.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    #[test]
    fn test_build_simple_table() {
        let table = build("STATES: 2\n0,0->0,0,R\n0,1->1,1,R\n1,0->1,1,RSTOP\n1,1->1,1,R\n")
            .unwrap();

        assert_eq!(table.max_states(), 2);
        assert_eq!(table.len(), 4);

        let t = table.lookup(1, Bit::Zero).unwrap();
        assert_eq!(t.next_state, 1);
        assert_eq!(t.write, Bit::One);
        assert!(t.halt);
        assert!(table.can_halt());
    }

    #[test]
    fn test_build_partial_table_keeps_defaults() {
        let table = build("STATES: 3\n0,0->2,1,L\n").unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(table.lookup(0, Bit::Zero).unwrap().direction, Direction::Left);
        assert_eq!(
            table.lookup(0, Bit::One).unwrap(),
            &Transition::fallback(0, Bit::One)
        );
        assert_eq!(
            table.lookup(2, Bit::Zero).unwrap(),
            &Transition::fallback(2, Bit::Zero)
        );
        assert!(!table.can_halt());
    }

    #[test]
    fn test_slots_follow_line_order() {
        // Both lines claim slot (0, 0); they fill (0, 0) and (0, 1) in turn.
        let table = build("STATES: 2\n0,0->1,1,R\n0,0->0,0,LSTOP\n").unwrap();

        assert_eq!(table.lookup(0, Bit::Zero).unwrap().next_state, 1);
        let second = table.lookup(0, Bit::One).unwrap();
        assert_eq!(second.direction, Direction::Left);
        assert!(second.halt);
    }

    #[test]
    fn test_slots_follow_declared_values() {
        let table = TableBuilder::new()
            .slot_order(SlotOrder::Declared)
            .build("STATES: 2\n1,1->0,0,LSTOP\n0,0->1,1,R\n")
            .unwrap();

        assert!(table.lookup(1, Bit::One).unwrap().halt);
        assert_eq!(table.lookup(0, Bit::Zero).unwrap().next_state, 1);
        assert_eq!(
            table.lookup(0, Bit::One).unwrap(),
            &Transition::fallback(0, Bit::One)
        );
    }

    #[test]
    fn test_build_rejects_bad_header() {
        for source in ["", "STATE: 2\n", "STATES: 0\n", "STATES: 128\n", "0,0->0,0,R\n"] {
            match build(source) {
                Err(TapeMachineError::InstructionFormat { line, .. }) => assert_eq!(line, 1),
                other => panic!("Expected a header error for {source:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_build_rejects_short_line() {
        let err = build("STATES: 1\n0,0->0,0,R\n0,1->0\n").unwrap_err();

        match err {
            TapeMachineError::InstructionFormat { line, content, .. } => {
                assert_eq!(line, 3);
                assert_eq!(content, "0,1->0");
            }
            other => panic!("Expected InstructionFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_build_rejects_state_out_of_range() {
        let err = build("STATES: 2\n0,0->2,0,R\n").unwrap_err();

        match err {
            TapeMachineError::InstructionFormat { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("out of range"));
            }
            other => panic!("Expected InstructionFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_build_accepts_crlf() {
        let table = build("STATES: 1\r\n0,0->0,1,RSTOP\r\n").unwrap();
        assert!(table.lookup(0, Bit::Zero).unwrap().halt);
    }

    #[test]
    #[traced_test]
    fn test_trailing_content_is_ignored_with_warning() {
        let table = build("STATES: 1\n0,0->0,1,R\n0,1->0,0,R\nnot an instruction\n").unwrap();

        assert_eq!(table.len(), 2);
        assert!(logs_contain("Ignoring instruction set content from line 4"));
    }

    #[test]
    fn test_lookup_invalid_state() {
        let table = TransitionTable::with_defaults(2);

        assert!(matches!(
            table.lookup(2, Bit::Zero),
            Err(TapeMachineError::InvalidState { state: 2, max_states: 2 })
        ));
    }

    proptest! {
        #[test]
        fn header_only_yields_all_default_entries(n in 1usize..=127) {
            let table = build(&format!("STATES: {n}\n")).unwrap();

            prop_assert_eq!(table.len(), 2 * n);
            for ((state, symbol), t) in table.iter() {
                prop_assert_eq!(*t, Transition::fallback(state, symbol));
            }
        }
    }
}
