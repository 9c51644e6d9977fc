use httpmock::Method::GET;
use httpmock::{Mock, MockServer};
use serde_json::{json, Value};

pub const SUBJECT: &str = "alice";
pub const TOKEN: &str = "test-token";

pub fn releases_path(subject: &str) -> String {
    format!("/users/{}/collection/folders/0/releases", subject)
}

pub fn release_json(id: u64, date_added: &str, title: &str, artist: &str) -> Value {
    json!({
        "id": id,
        "instance_id": id * 10,
        "date_added": date_added,
        "rating": 0,
        "basic_information": {
            "id": id + 1000,
            "master_id": 0,
            "title": title,
            "year": 1999,
            "thumb": format!("https://img.example/{}.jpg", id),
            "cover_image": "",
            "resource_url": format!("https://api.example/releases/{}", id + 1000),
            "artists": [{"name": artist, "id": 1}],
            "formats": [{"name": "Vinyl", "qty": "1", "descriptions": ["LP"]}],
            "labels": [{"name": "Label", "catno": format!("CAT-{}", id)}]
        },
        "notes": []
    })
}

pub fn collection_body(
    page: u32,
    pages: u32,
    per_page: u32,
    items: u32,
    releases: Vec<Value>,
) -> Value {
    json!({
        "pagination": {"page": page, "pages": pages, "per_page": per_page, "items": items},
        "releases": releases
    })
}

/// Discogs API double.
pub struct DiscogsMock {
    pub server: MockServer,
}

impl DiscogsMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.base_url()
    }

    /// Collection page served in the remote's default order.
    pub async fn mock_page(&self, page: u32, per_page: u32, body: Value) -> Mock<'_> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        let bearer = format!("Bearer {}", TOKEN);
        self.server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(releases_path(SUBJECT))
                    .query_param("page", page.as_str())
                    .query_param("per_page", per_page.as_str())
                    .header("authorization", bearer.as_str());
                then.status(200).json_body(body);
            })
            .await
    }

    /// Collection page served newest-added first.
    pub async fn mock_newest_first(&self, page: u32, per_page: u32, body: Value) -> Mock<'_> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        self.server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(releases_path(SUBJECT))
                    .query_param("page", page.as_str())
                    .query_param("per_page", per_page.as_str())
                    .query_param("sort", "added")
                    .query_param("sort_order", "desc");
                then.status(200).json_body(body);
            })
            .await
    }
}
