//! Library API over an in-memory catalog
//!
//! Run with `cargo run --example library_api [config.yaml]`, then try:
//!
//! ```text
//! curl 'localhost:3000/books/filters'
//! curl -G 'localhost:3000/books' \
//!   --data-urlencode 'filter=[{"field":"authors","operator":"EQUAL","value":"Ursula K. Le Guin"}]' \
//!   --data-urlencode 'order={"field":"published","value":"asc"}' \
//!   --data-urlencode 'count=2'
//! ```

use libris::prelude::*;

fn seed(repository: &InMemoryRepository) -> Result<()> {
    let le_guin = json!({"id": 1, "name": "Ursula K. Le Guin"});
    let herbert = json!({"id": 2, "name": "Frank Herbert"});
    let butler = json!({"id": 3, "name": "Octavia E. Butler"});

    let books = vec![
        json!({"id": 1, "title": "A Wizard of Earthsea", "isbn": "978-0547773742",
               "published": "1968-11-01T00:00:00Z", "createdAt": "2024-02-01T09:00:00Z",
               "authors": [le_guin], "categories": [{"name": "Fantasy"}]}),
        json!({"id": 2, "title": "The Left Hand of Darkness", "isbn": "978-0441478125",
               "published": "1969-03-01T00:00:00Z", "createdAt": "2024-02-02T09:00:00Z",
               "authors": [le_guin], "categories": [{"name": "Science Fiction"}]}),
        json!({"id": 3, "title": "The Dispossessed", "isbn": "978-0061054884",
               "published": "1974-05-01T00:00:00Z", "createdAt": "2024-02-03T09:00:00Z",
               "authors": [le_guin], "categories": [{"name": "Science Fiction"}]}),
        json!({"id": 4, "title": "Dune", "isbn": "978-0441013593",
               "published": "1965-08-01T00:00:00Z", "createdAt": "2024-02-04T09:00:00Z",
               "authors": [herbert], "categories": [{"name": "Science Fiction"}]}),
        json!({"id": 5, "title": "Kindred", "isbn": null,
               "published": "1979-06-01T00:00:00Z", "createdAt": "2024-02-05T09:00:00Z",
               "authors": [butler], "categories": [{"name": "Fiction"}]}),
    ];
    repository.insert_many("books", books)?;

    repository.insert_many(
        "authors",
        vec![
            json!({"id": 1, "name": "Ursula K. Le Guin", "createdAt": "2024-01-10",
                   "books": [{"title": "A Wizard of Earthsea"}, {"title": "The Left Hand of Darkness"},
                             {"title": "The Dispossessed"}]}),
            json!({"id": 2, "name": "Frank Herbert", "createdAt": "2024-01-11",
                   "books": [{"title": "Dune"}]}),
            json!({"id": 3, "name": "Octavia E. Butler", "createdAt": "2024-01-12",
                   "books": [{"title": "Kindred"}]}),
        ],
    )?;

    repository.insert_many(
        "users",
        vec![
            json!({"id": 1, "name": "Alice", "email": "alice@example.com", "createdAt": "2024-03-01",
                   "loans": [{"Book": {"title": "Dune"}}]}),
            json!({"id": 2, "name": "Bob", "email": "bob@example.com", "createdAt": "2024-03-02",
                   "loans": []}),
        ],
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => LibrisConfig::from_yaml_file(path)?,
        None => LibrisConfig::default(),
    };
    init_logging(&config.logging)?;

    let repository = InMemoryRepository::new();
    seed(&repository)?;

    let addr = config.socket_addr()?.to_string();
    ServerBuilder::new()
        .with_config(&config)?
        .with_repository(repository)
        .with_permissive_cors()
        .serve(&addr)
        .await
}
