pub mod polls;
pub mod votes;

pub use polls::PollsRepository;
pub use votes::VotesRepository;
