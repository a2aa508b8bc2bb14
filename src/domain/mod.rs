mod claude;
mod clock;
mod parse;
mod text;
mod tool_call;
mod transcript;
mod types;

pub use claude::*;
pub use clock::*;
pub use parse::*;
pub use text::*;
pub use tool_call::*;
pub use transcript::*;
pub use types::*;
