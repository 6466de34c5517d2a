mod effects;
mod pool;
mod round;
mod session;

pub use effects::{Deferred, Effect};
pub use pool::{ItemPool, RandomPicker, SequentialPicker, TargetPicker};
pub use round::{score_for, Round, RoundController, RoundEvent, RoundStatus};
pub use session::{RoundTicket, SessionController, SessionRules, SessionSnapshot};
