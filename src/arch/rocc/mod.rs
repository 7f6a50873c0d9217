pub mod busy;
pub mod chunker;
pub mod command;
pub mod fault;
pub mod interface;
pub mod op;
pub mod operand;
pub mod params;
pub mod queue;

#[cfg(test)]
mod mock;

pub use command::{Command, Opcode, Response, RESP_FAIL, RESP_OK};
pub use fault::{Fault, ParamError};
pub use interface::{RoccInterface, RoccStats};
pub use op::OpState;
pub use operand::{DataType, OperandCodec};
pub use params::RoccParams;
