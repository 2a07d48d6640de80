use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct LibraryPlaylist {
    pub id: String,
    pub attributes: Option<PlaylistAttributes>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistAttributes {
    pub name: String,
    pub artwork: Option<Artwork>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Artwork {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}
