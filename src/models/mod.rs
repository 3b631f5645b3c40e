pub mod song;

pub use song::{
    EditSongRequest, EditSongResponse, Group, NewSongRequest, Song, SongDetails, SongInfo,
    SongListResponse, SongTextResponse,
};
