use std::backtrace::Backtrace;

use crate::solver::engine::VariableId;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A violation of the message protocol between variable agents.
///
/// The engine assumes a well-formed run: every variable receives exactly one
/// tree notification and one normalization payload, VALUE traffic only ever
/// comes from a variable's parent, and COST traffic only from its children.
/// Anything else is fatal; the protocol makes no attempt at recovery.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("message addressed to unknown variable ?{0}")]
    UnknownVariable(VariableId),

    #[error("duplicate tree notification for ?{0}")]
    DuplicateTreeNotify(VariableId),

    #[error("duplicate normalization payload for ?{0}")]
    DuplicateNormalize(VariableId),

    #[error("?{variable} received a message before its tree notification")]
    MessageBeforeTree { variable: VariableId },

    #[error("?{variable} received VALUE from ?{sender}, which is not its parent")]
    ValueFromNonParent {
        variable: VariableId,
        sender: VariableId,
    },

    #[error("?{variable} received COST from ?{sender}, which is not one of its children")]
    CostFromNonChild {
        variable: VariableId,
        sender: VariableId,
    },

    #[error("?{variable} buffered a second VALUE before normalization")]
    ValueBufferOverflow { variable: VariableId },

    #[error("?{variable} received VALUE_FIN before its normalization payload")]
    ValueFinBeforeNormalize { variable: VariableId },

    #[error("?{variable} received COST from ?{sender} with no sampling round outstanding")]
    UnexpectedCost {
        variable: VariableId,
        sender: VariableId,
    },

    #[error("?{variable} received {kind} after committing")]
    MessageAfterCommit {
        variable: VariableId,
        kind: &'static str,
    },

    #[error("message misrouted between agents and the stats sink (variable ?{variable})")]
    MisroutedReport { variable: VariableId },

    #[error("attempt to overwrite the finalised context value of ?{0}")]
    FinalContextOverwrite(VariableId),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol: {inner}\n{backtrace}")]
    Protocol {
        inner: Box<ProtocolError>,
        backtrace: Box<Backtrace>,
    },

    /// The message queue drained while variables were still uncommitted. A
    /// correct feed never produces this; it is the diagnostic surface for a
    /// miswired problem definition (e.g. a disconnected tree).
    #[error("run stalled: queue drained with {remaining} variable(s) uncommitted")]
    Stalled { remaining: usize },

    /// The caller-imposed delivery budget ran out before every variable
    /// committed. The run is inconclusive, not wrong.
    #[error("inconclusive: message budget of {budget} exhausted")]
    Inconclusive { budget: u64 },
}

impl From<ProtocolError> for Error {
    fn from(inner: ProtocolError) -> Self {
        Error::Protocol {
            inner: Box::new(inner),
            backtrace: Box::new(std::backtrace::Backtrace::capture()),
        }
    }
}
