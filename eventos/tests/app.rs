//! The assembled application, driven over HTTP.

use chrono::NaiveDate;
use eventos::{router, Database, Evento, Voluntario};
use eventos_core::{DatabaseEngine, DatabaseSettings, Settings};
use eventos_test::{
    assert_contains, assert_not_contains, assert_redirects, assert_status, form_data, TestClient,
};

fn settings() -> Settings {
    Settings {
        static_dir: None,
        ..Settings::default()
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn client(db: &Database) -> TestClient {
    TestClient::new(router(settings(), db).unwrap())
}

async fn seed_eventos(db: &Database, items: &[(&str, &str, &str)]) {
    for (titulo, descripcion, fecha) in items {
        db.eventos()
            .save(Evento::new(*titulo, *descripcion, date(fecha)))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_index_page() {
    let mut client = client(&Database::in_memory());
    let response = client.get("/").await;
    assert_status(&response, 200);
    assert_contains(&response, "Gestión de eventos");
    assert_contains(&response, r#"href="/voluntarios""#);
    assert_status(&client.get("/no-existe/").await, 404);
}

#[tokio::test]
async fn test_created_evento_listed_by_date_and_searchable() {
    let db = Database::in_memory();
    seed_eventos(
        &db,
        &[
            ("Concierto", "Música en la plaza", "2024-03-10"),
            ("Mercadillo", "Segunda mano", "2023-11-20"),
        ],
    )
    .await;
    let mut client = client(&db);

    let response = client
        .post(
            "/eventos/",
            &form_data(&[
                ("action", "create"),
                ("titulo", "Feria"),
                ("descripcion", "Feria anual"),
                ("fecha", "2024-05-01"),
            ]),
        )
        .await;
    assert_redirects(&response, "/eventos/");

    let listing = client.follow(&response).await;
    assert_status(&listing, 200);
    assert_contains(&listing, "Evento creado correctamente.");
    let body = listing.text();
    let feria = body.find("Feria anual").unwrap();
    let concierto = body.find("Concierto").unwrap();
    let mercadillo = body.find("Mercadillo").unwrap();
    assert!(feria < concierto && concierto < mercadillo);

    for q in ["feria", "FERIA", "fErIa"] {
        let found = client.get(&format!("/eventos/?q={q}")).await;
        assert_contains(&found, "Feria anual");
        assert_not_contains(&found, "Concierto");
        assert_not_contains(&found, "Mercadillo");
    }
}

#[tokio::test]
async fn test_search_matches_description() {
    let db = Database::in_memory();
    seed_eventos(
        &db,
        &[
            ("Concierto", "Música en la plaza", "2024-03-10"),
            ("Mercadillo", "Segunda mano en la PLAZA", "2023-11-20"),
            ("Taller", "Cerámica", "2024-01-05"),
        ],
    )
    .await;
    let mut client = client(&db);
    let response = client.get("/eventos/?q=plaza").await;
    assert_contains(&response, "Concierto");
    assert_contains(&response, "Mercadillo");
    assert_not_contains(&response, "Cerámica");
    assert_contains(&response, r#"value="plaza""#);
}

#[tokio::test]
async fn test_pages_cover_listing_exactly_once() {
    let db = Database::in_memory();
    for day in 1..=12 {
        db.eventos()
            .save(Evento::new(
                format!("Evento-{day:02}"),
                "Reunión",
                NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            ))
            .await
            .unwrap();
    }
    let mut client = client(&db);

    let mut seen = Vec::new();
    for page in 1..=3 {
        let response = client.get(&format!("/eventos/?page={page}")).await;
        assert_contains(&response, &format!("Página {page} de 3"));
        let body = response.text();
        let mut on_page: Vec<(usize, u32)> = (1..=12)
            .filter_map(|day| body.find(&format!("Evento-{day:02}")).map(|pos| (pos, day)))
            .collect();
        assert!(on_page.len() <= 5);
        on_page.sort_unstable();
        seen.extend(on_page.into_iter().map(|(_, day)| day));
    }
    assert_eq!(seen, (1..=12).rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_pagination_links_keep_search() {
    let db = Database::in_memory();
    for day in 1..=6 {
        db.eventos()
            .save(Evento::new(
                format!("Feria {day}"),
                "Feria de barrio",
                NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            ))
            .await
            .unwrap();
    }
    let mut client = client(&db);
    let response = client.get("/eventos/?q=feria%20de").await;
    assert_contains(&response, "?page=2&amp;q=feria%20de");
}

#[tokio::test]
async fn test_create_then_read_returns_submitted_fields() {
    let db = Database::in_memory();
    let mut client = client(&db);
    let response = client
        .post(
            "/voluntarios",
            &form_data(&[
                ("action", "create"),
                ("nombre", "Lucía Pérez"),
                ("email", "lucia@example.org"),
                ("telefono", "+34 600 111 222"),
            ]),
        )
        .await;
    assert_redirects(&response, "/voluntarios");
    let listing = client.follow(&response).await;
    assert_contains(&listing, "Voluntario creado correctamente.");

    let stored = db.voluntarios().find_by_id(1).await.unwrap().unwrap();
    assert_eq!(
        stored,
        Voluntario {
            id: Some(1),
            nombre: "Lucía Pérez".to_string(),
            email: "lucia@example.org".to_string(),
            telefono: "+34 600 111 222".to_string(),
        }
    );

    let detail = client.get("/voluntarios/1/").await;
    assert_status(&detail, 200);
    assert_contains(&detail, r#"value="lucia@example.org""#);
    assert_contains(&detail, r#"name="action" value="update""#);
    assert_contains(&detail, r#"maxlength="15""#);
}

#[tokio::test]
async fn test_invalid_voluntario_rejected() {
    let db = Database::in_memory();
    let mut client = client(&db);
    let response = client
        .post(
            "/voluntarios",
            &form_data(&[
                ("action", "create"),
                ("nombre", "Lucía"),
                ("email", "lucia-sin-arroba"),
                ("telefono", "1234567890123456"),
            ]),
        )
        .await;
    assert_redirects(&response, "/voluntarios");
    let listing = client.follow(&response).await;
    assert_contains(&listing, "Error al crear el voluntario.");
    assert!(db.voluntarios().find_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_update_leaves_evento_unchanged() {
    let db = Database::in_memory();
    seed_eventos(&db, &[("Concierto", "Música en la plaza", "2024-03-10")]).await;
    let mut client = client(&db);

    let response = client
        .post(
            "/eventos/1/",
            &form_data(&[
                ("action", "update"),
                ("id", "1"),
                ("titulo", "Concierto de primavera"),
                ("descripcion", "Música"),
                ("fecha", "10/03/2024"),
            ]),
        )
        .await;
    assert_redirects(&response, "/eventos/");
    let listing = client.follow(&response).await;
    assert_contains(&listing, "Error al actualizar el evento.");

    let stored = db.eventos().find_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.titulo, "Concierto");
    assert_eq!(stored.descripcion, "Música en la plaza");
    assert_eq!(stored.fecha, Some(date("2024-03-10")));
}

#[tokio::test]
async fn test_update_evento() {
    let db = Database::in_memory();
    seed_eventos(&db, &[("Concierto", "Música en la plaza", "2024-03-10")]).await;
    let mut client = client(&db);

    let detail = client.get("/eventos/1/").await;
    assert_contains(&detail, "Música en la plaza</textarea>");
    assert_contains(&detail, r#"value="2024-03-10""#);

    let response = client
        .post(
            "/eventos/1/",
            &form_data(&[
                ("action", "update"),
                ("id", "1"),
                ("titulo", "Concierto de primavera"),
                ("descripcion", "Música en la plaza"),
                ("fecha", "2024-03-21"),
            ]),
        )
        .await;
    let listing = client.follow(&response).await;
    assert_contains(&listing, "Evento actualizado correctamente.");
    assert_contains(&listing, "Concierto de primavera");
    assert_eq!(
        db.eventos().find_by_id(1).await.unwrap().unwrap().fecha,
        Some(date("2024-03-21"))
    );
}

#[tokio::test]
async fn test_double_delete_is_not_found() {
    let db = Database::in_memory();
    db.voluntarios()
        .save(Voluntario::new("Ana", "ana@example.com", "555-0101"))
        .await
        .unwrap();
    let mut client = client(&db);
    let data = form_data(&[("action", "delete"), ("id", "1")]);

    let first = client.post("/voluntarios", &data).await;
    assert_redirects(&first, "/voluntarios");
    let listing = client.follow(&first).await;
    assert_contains(&listing, "Voluntario eliminado correctamente.");

    assert_status(&client.post("/voluntarios", &data).await, 404);
    assert_status(&client.get("/voluntarios/1/").await, 404);
}

#[tokio::test]
async fn test_sqlite_storage_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let database = DatabaseSettings {
        engine: DatabaseEngine::Sqlite,
        name: dir.path().join("eventos.sqlite3").display().to_string(),
    };
    let db = Database::connect(&database).unwrap();
    db.migrate().await.unwrap();
    let mut client = client(&db);

    let response = client
        .post(
            "/eventos/",
            &form_data(&[
                ("action", "create"),
                ("titulo", "Feria"),
                ("descripcion", "Feria anual"),
                ("fecha", "2024-05-01"),
            ]),
        )
        .await;
    assert_redirects(&response, "/eventos/");
    assert_contains(&client.get("/eventos/?q=FERIA").await, "Feria anual");

    let reopened = Database::connect(&database).unwrap();
    let stored = reopened.eventos().find_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.titulo, "Feria");
    assert_eq!(stored.fecha, Some(date("2024-05-01")));
}
