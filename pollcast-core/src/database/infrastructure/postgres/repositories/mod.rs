pub mod polls;
pub mod votes;

pub use polls::PostgresPollsRepository;
pub use votes::PostgresVotesRepository;
