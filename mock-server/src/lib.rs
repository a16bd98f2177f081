use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

/// User record carrying both the jsonplaceholder and the dummyjson fields, so
/// either client can decode it from `/users/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image: String,
}

impl User {
    pub fn new(id: u64, name: &str, username: &str, email: &str) -> Self {
        let (first_name, last_name) = split_name(name);
        Self {
            id,
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            first_name,
            last_name,
            image: format!("https://dummyjson.com/icon/{}/128", username.to_lowercase()),
        }
    }
}

#[derive(Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gif {
    pub id: String,
    pub url: String,
    pub title: String,
    pub images: GifImages,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GifImages {
    pub original: GifImage,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GifImage {
    pub url: String,
}

impl Gif {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            url: format!("https://giphy.com/gifs/{id}"),
            title: title.to_string(),
            images: GifImages {
                original: GifImage {
                    url: format!("https://media.giphy.com/media/{id}/giphy.gif"),
                },
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GifPage {
    pub data: Vec<Gif>,
}

#[derive(Deserialize)]
pub struct GifQuery {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Giphy's own default page size.
const GIPHY_DEFAULT_LIMIT: usize = 25;

const SEED_USERS: [(&str, &str, &str); 10] = [
    ("Leanne Graham", "Bret", "Sincere@april.biz"),
    ("Ervin Howell", "Antonette", "Shanna@melissa.tv"),
    ("Clementine Bauch", "Samantha", "Nathan@yesenia.net"),
    ("Patricia Lebsack", "Karianne", "Julianne.OConner@kory.org"),
    ("Chelsey Dietrich", "Kamren", "Lucio_Hettinger@annie.ca"),
    ("Dennis Schulist", "Leopoldo_Corkery", "Karley_Dach@jasper.info"),
    ("Kurtis Weissnat", "Elwyn.Skiles", "Telly.Hoeger@billy.biz"),
    ("Nicholas Runolfsdottir", "Maxime_Nienow", "Sherwood@rosamond.me"),
    ("Glenna Reichert", "Delphine", "Chaim_McDermott@dana.io"),
    ("Clementina DuBuque", "Moriah.Stanton", "Rey.Padberg@karina.biz"),
];

const SEED_GIFS: [(&str, &str); 8] = [
    ("JIX9t2j0ZTN9S", "cat typing"),
    ("mlvseq9yvZhba", "dog wave"),
    ("VbnUQpnihPSIgIXuZv", "cat jump fail"),
    ("l0MYt5jPR6QX5pnqM", "party parrot"),
    ("111ebonMs90YLu", "thumbs up"),
    ("XsUtdIeJ0MWMo", "facepalm"),
    ("3o7btPCcdNniyf0ArS", "dancing cat"),
    ("26ufdipQqU2lhNA4g", "mind blown"),
];

/// Seed data and fault injection for one server instance.
#[derive(Clone, Debug)]
pub struct Fixture {
    users: Vec<User>,
    gifs: Vec<Gif>,
    delays: HashMap<String, Duration>,
    malformed: HashSet<String>,
    failing: HashMap<String, StatusCode>,
}

impl Fixture {
    /// No users, no gifs, no faults.
    pub fn empty() -> Self {
        Self {
            users: Vec::new(),
            gifs: Vec::new(),
            delays: HashMap::new(),
            malformed: HashSet::new(),
            failing: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_gif(mut self, gif: Gif) -> Self {
        self.gifs.push(gif);
        self
    }

    /// Hold every `/users/{id}` response for `delay` before answering.
    pub fn delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    /// Answer `/users/{id}` with 200 and a truncated JSON body.
    pub fn malformed(mut self, id: &str) -> Self {
        self.malformed.insert(id.to_string());
        self
    }

    /// Answer `/users/{id}` with `status` and an error body.
    pub fn failing(mut self, id: &str, status: StatusCode) -> Self {
        self.failing.insert(id.to_string(), status);
        self
    }
}

impl Default for Fixture {
    /// Ten jsonplaceholder-style users and a handful of gifs.
    fn default() -> Self {
        let users = SEED_USERS
            .iter()
            .zip(1u64..)
            .map(|(&(name, username, email), id)| User::new(id, name, username, email));
        let gifs = SEED_GIFS.iter().map(|&(id, title)| Gif::new(id, title));
        Self {
            users: users.collect(),
            gifs: gifs.collect(),
            ..Self::empty()
        }
    }
}

pub(crate) struct Store {
    users: BTreeMap<String, User>,
    next_id: u64,
    gifs: Vec<Gif>,
    delays: HashMap<String, Duration>,
    malformed: HashSet<String>,
    failing: HashMap<String, StatusCode>,
}

impl From<Fixture> for Store {
    fn from(fixture: Fixture) -> Self {
        let next_id = fixture.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Self {
            users: fixture
                .users
                .into_iter()
                .map(|u| (u.id.to_string(), u))
                .collect(),
            next_id,
            gifs: fixture.gifs,
            delays: fixture.delays,
            malformed: fixture.malformed,
            failing: fixture.failing,
        }
    }
}

type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Fixture::default())
}

pub fn app_with(fixture: Fixture) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::from(fixture)));
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/v1/gifs/search", get(search_gifs))
        .route("/v1/gifs/trending", get(trending_gifs))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Fixture::default()).await
}

pub async fn serve(listener: TcpListener, fixture: Fixture) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(fixture)).await
}

fn split_name(name: &str) -> (String, String) {
    match name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (name.to_string(), String::new()),
    }
}

async fn get_user(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let delay = db.read().await.delays.get(&id).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let store = db.read().await;
    if let Some(status) = store.failing.get(&id) {
        return (*status, Json(json!({ "message": "injected failure" }))).into_response();
    }
    if store.malformed.contains(&id) {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"id":1,"name":"#,
        )
            .into_response();
    }
    match store.users.get(&id) {
        Some(user) => Json(user.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

async fn create_user(State(db): State<Db>, Json(input): Json<NewUser>) -> (StatusCode, Json<User>) {
    let mut store = db.write().await;
    let user = User::new(store.next_id, &input.name, &input.username, &input.email);
    store.next_id += 1;
    store.users.insert(user.id.to_string(), user.clone());
    tracing::info!(id = user.id, "user created");
    (StatusCode::CREATED, Json(user))
}

async fn delete_user(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let mut store = db.write().await;
    match store.users.remove(&id) {
        Some(_) => (StatusCode::OK, Json(json!({}))).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

async fn search_gifs(State(db): State<Db>, Query(query): Query<GifQuery>) -> Response {
    if query.api_key.is_empty() {
        return unauthorized();
    }
    let needle = query.q.to_lowercase();
    let store = db.read().await;
    let data = store
        .gifs
        .iter()
        .filter(|gif| gif.title.to_lowercase().contains(&needle))
        .take(query.limit.unwrap_or(GIPHY_DEFAULT_LIMIT))
        .cloned()
        .collect();
    Json(GifPage { data }).into_response()
}

async fn trending_gifs(State(db): State<Db>, Query(query): Query<GifQuery>) -> Response {
    if query.api_key.is_empty() {
        return unauthorized();
    }
    let store = db.read().await;
    let data = store
        .gifs
        .iter()
        .take(query.limit.unwrap_or(GIPHY_DEFAULT_LIMIT))
        .cloned()
        .collect();
    Json(GifPage { data }).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "No API key found in request." })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_both_schemas() {
        let user = User::new(1, "Leanne Graham", "Bret", "Sincere@april.biz");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Leanne Graham");
        assert_eq!(json["firstName"], "Leanne");
        assert_eq!(json["lastName"], "Graham");
        assert_eq!(json["image"], "https://dummyjson.com/icon/bret/128");
    }

    #[test]
    fn single_word_name_has_empty_last_name() {
        let user = User::new(2, "Prince", "prince", "p@example.com");
        assert_eq!(user.first_name, "Prince");
        assert_eq!(user.last_name, "");
    }

    #[test]
    fn default_fixture_seeds_ten_users() {
        let store = Store::from(Fixture::default());
        assert_eq!(store.users.len(), 10);
        assert_eq!(store.next_id, 11);
        assert_eq!(store.users["1"].username, "Bret");
        assert_eq!(store.gifs.len(), SEED_GIFS.len());
    }

    #[test]
    fn empty_fixture_starts_ids_at_one() {
        let store = Store::from(Fixture::empty());
        assert!(store.users.is_empty());
        assert_eq!(store.next_id, 1);
    }

    #[test]
    fn new_user_rejects_missing_email() {
        let result: Result<NewUser, _> = serde_json::from_str(r#"{"name":"A","username":"a"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn gif_query_fields_are_optional() {
        let query: GifQuery = serde_json::from_str("{}").unwrap();
        assert!(query.api_key.is_empty());
        assert!(query.q.is_empty());
        assert!(query.limit.is_none());
    }
}
