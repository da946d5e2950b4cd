//! This module provides the line parser for instruction sets, utilizing the `pest` crate.
//! It defines the grammar for the `STATES:` header and for transition lines, and turns
//! single lines into typed values. Assembling lines into a table is done by
//! [`crate::table::TableBuilder`].

use crate::types::{Bit, Direction, TapeMachineError, Transition, MAX_STATES};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Position, Span,
};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the instruction-set grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct InstructionParser;

/// A transition line as written: the slot it declares and the transition it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// The `<state>` on the left-hand side of `->`.
    pub state: usize,
    /// The `<symbol>` on the left-hand side of `->`.
    pub symbol: Bit,
    pub transition: Transition,
}

/// Parses a `STATES: <N>` header line and returns `N`.
///
/// # Returns
///
/// * `Ok(n)` with `1 <= n <= MAX_STATES`.
/// * `Err(TapeMachineError::Grammar)` if the line is not a header or `N` is out of range.
pub fn parse_header(line: &str) -> Result<usize, TapeMachineError> {
    let header = InstructionParser::parse(Rule::header, line)
        .map_err(|e| TapeMachineError::Grammar(Box::new(e)))?;
    let mut inner = first_pair(header, line)?.into_inner();

    let number = next_pair(&mut inner, line)?;
    let states = parse_number(&number)?;

    if states == 0 || states > MAX_STATES {
        return Err(parse_error(
            &format!("state count must be between 1 and {MAX_STATES}, got {states}"),
            number.as_span(),
        ));
    }

    Ok(states)
}

/// Parses one `<state>,<symbol>-><next_state>,<write>,<dir>[STOP]` line.
///
/// Both state numbers must be below `max_states`.
pub fn parse_instruction(
    line: &str,
    max_states: usize,
) -> Result<ParsedInstruction, TapeMachineError> {
    let instruction = InstructionParser::parse(Rule::instruction, line)
        .map_err(|e| TapeMachineError::Grammar(Box::new(e)))?;
    let mut inner = first_pair(instruction, line)?.into_inner();

    let state = parse_state(next_pair(&mut inner, line)?, max_states)?;
    let symbol = parse_bit(&next_pair(&mut inner, line)?);
    let next_state = parse_state(next_pair(&mut inner, line)?, max_states)?;
    let write = parse_bit(&next_pair(&mut inner, line)?);
    let direction = parse_direction(&next_pair(&mut inner, line)?);

    // Rule: instruction > stop?
    let halt = inner.any(|p| p.as_rule() == Rule::stop);

    Ok(ParsedInstruction {
        state,
        symbol,
        transition: Transition {
            next_state,
            write,
            direction,
            halt,
        },
    })
}

/// Parses a state number and checks it against the declared state count.
fn parse_state(pair: Pair<Rule>, max_states: usize) -> Result<usize, TapeMachineError> {
    let state = parse_number(&pair)?;
    if state >= max_states {
        return Err(parse_error(
            &format!("state {state} is out of range (STATES: {max_states})"),
            pair.as_span(),
        ));
    }

    Ok(state)
}

fn parse_number(pair: &Pair<Rule>) -> Result<usize, TapeMachineError> {
    pair.as_str()
        .parse::<usize>()
        .map_err(|e| parse_error(&e.to_string(), pair.as_span()))
}

fn parse_bit(pair: &Pair<Rule>) -> Bit {
    if pair.as_str() == "1" {
        Bit::One
    } else {
        Bit::Zero
    }
}

fn parse_direction(pair: &Pair<Rule>) -> Direction {
    if pair.as_str() == "L" {
        Direction::Left
    } else {
        Direction::Right
    }
}

fn first_pair<'i>(
    mut pairs: Pairs<'i, Rule>,
    line: &'i str,
) -> Result<Pair<'i, Rule>, TapeMachineError> {
    next_pair(&mut pairs, line)
}

fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    line: &'i str,
) -> Result<Pair<'i, Rule>, TapeMachineError> {
    pairs.next().ok_or_else(|| {
        let end = Position::new(line, line.len()).unwrap_or_else(|| Position::from_start(line));
        TapeMachineError::Grammar(Box::new(Error::new_from_pos(
            ErrorVariant::CustomError {
                message: "unexpected end of line".to_string(),
            },
            end,
        )))
    })
}

/// Creates a `TapeMachineError::Grammar` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TapeMachineError {
    TapeMachineError::Grammar(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}
