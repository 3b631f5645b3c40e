pub mod lyrics;
pub mod song_filter;
pub mod song_info;
pub mod song_repository;

pub use song_filter::SongFilter;
pub use song_info::SongInfoClient;
pub use song_repository::SongRepository;
