pub mod catalog;
pub mod ledger;
pub mod membership;
pub mod tally;
pub mod unit_of_work;

use std::sync::Arc;

pub use catalog::PollCatalog;
pub use ledger::{CommittedVote, VoteLedger};
pub use membership::{Admission, AdmissionError, SessionMembership};
pub use tally::TallyAggregator;

use crate::broadcast::RoomRegistry;
use unit_of_work::PollUnitOfWork;

/// The application services wired against one storage backend and one
/// broadcast hub.
#[derive(Debug, Clone)]
pub struct PollServices {
    pub catalog: PollCatalog,
    pub tally: TallyAggregator,
    pub ledger: VoteLedger,
    pub membership: SessionMembership,
}

impl PollServices {
    pub fn new(uow: PollUnitOfWork, rooms: Arc<dyn RoomRegistry>) -> Self {
        let tally = TallyAggregator::new(uow.clone());
        Self {
            catalog: PollCatalog::new(uow.clone()),
            ledger: VoteLedger::new(uow.clone(), tally.clone(), Arc::clone(&rooms)),
            membership: SessionMembership::new(uow, rooms),
            tally,
        }
    }
}
