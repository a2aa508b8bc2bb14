mod claude;
mod launch;
mod lines;
mod scan;
mod scan_all;
mod session_detail;

pub use claude::*;
pub use launch::*;
pub use lines::*;
pub use scan::*;
pub use scan_all::*;
pub use session_detail::*;
