//! Both repositories must behave the same for the operations the CRUD
//! controller relies on.

use std::sync::OnceLock;

use eventos_core::{EventosError, EventosResult};
use eventos_db::{
    FieldDef, FieldType, FromValue, InMemoryRepository, ListQuery, Model, ModelMeta, OrderBy,
    Repository, Row, SearchFilter, SqliteBackend, SqliteRepository, Value,
};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct Persona {
    id: Option<i64>,
    nombre: String,
    email: String,
}

impl Persona {
    fn new(nombre: &str, email: &str) -> Self {
        Self {
            id: None,
            nombre: nombre.to_string(),
            email: email.to_string(),
        }
    }
}

impl Model for Persona {
    fn meta() -> &'static ModelMeta {
        static META: OnceLock<ModelMeta> = OnceLock::new();
        META.get_or_init(|| ModelMeta {
            model_name: "persona",
            db_table: "contract_persona".to_string(),
            verbose_name: "persona".to_string(),
            verbose_name_plural: "personas".to_string(),
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField),
                FieldDef::new("nombre", FieldType::CharField).max_length(100),
                FieldDef::new("email", FieldType::EmailField),
            ],
            ordering: vec![OrderBy::asc("nombre")],
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("nombre", Value::from(self.nombre.as_str())),
            ("email", Value::from(self.email.as_str())),
        ]
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> EventosResult<()> {
        match name {
            "nombre" => self.nombre = String::from_value(&value)?,
            "email" => self.email = String::from_value(&value)?,
            other => return Err(EventosError::BadRequest(format!("Unknown field '{other}'"))),
        }
        Ok(())
    }

    fn from_row(row: &Row) -> EventosResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            nombre: row.get("nombre")?,
            email: row.get("email")?,
        })
    }
}

async fn sqlite_repo() -> SqliteRepository<Persona> {
    let repo = SqliteRepository::new(SqliteBackend::memory().unwrap());
    repo.create_table().await.unwrap();
    repo
}

async fn seed(repo: &dyn Repository<Persona>) {
    for (n, e) in [
        ("Ana", "ana@example.com"),
        ("Bruno", "bruno@example.org"),
        ("Carla", "carla@example.com"),
        ("Daniel", "dani@example.org"),
    ] {
        repo.save(Persona::new(n, e)).await.unwrap();
    }
}

async fn check_contract(repo: &dyn Repository<Persona>) {
    seed(repo).await;

    // newest id first
    let q = ListQuery::new().order_by(OrderBy::parse("-id"));
    let names: Vec<_> = repo
        .find_all(&q)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.nombre)
        .collect();
    assert_eq!(names, vec!["Daniel", "Carla", "Bruno", "Ana"]);

    // OR across fields
    let q = ListQuery::new()
        .search(SearchFilter::new("ORG", ["nombre", "email"]))
        .order_by(OrderBy::asc("nombre"));
    let names: Vec<_> = repo
        .find_all(&q)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.nombre)
        .collect();
    assert_eq!(names, vec!["Bruno", "Daniel"]);

    let q = ListQuery::new().search(SearchFilter::new("an", ["nombre"]));
    assert_eq!(repo.count(&q).await.unwrap(), 2);

    // a term with nowhere to look keeps everything
    let q = ListQuery::new()
        .search(SearchFilter::new("zzz", Vec::<String>::new()))
        .order_by(OrderBy::asc("nombre"));
    let names: Vec<_> = repo
        .find_all(&q)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.nombre)
        .collect();
    assert_eq!(names, vec!["Ana", "Bruno", "Carla", "Daniel"]);

    // whitespace is searched literally
    let q = ListQuery::new().search(SearchFilter::new("  ", ["nombre", "email"]));
    assert_eq!(repo.count(&q).await.unwrap(), 0);

    // round trip
    let created = repo
        .save(Persona::new("Elena", "elena@example.com"))
        .await
        .unwrap();
    let id = created.id.unwrap();
    let fetched = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    // delete twice
    assert!(repo.delete(id).await.unwrap());
    assert!(!repo.delete(id).await.unwrap());
    assert!(repo.find_by_id(id).await.unwrap().is_none());

    // updating something that is gone
    let err = repo.save(created).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_in_memory_contract() {
    let repo = InMemoryRepository::<Persona>::new();
    check_contract(&repo).await;
}

#[tokio::test]
async fn test_sqlite_contract() {
    let repo = sqlite_repo().await;
    check_contract(&repo).await;
}

#[tokio::test]
async fn test_sqlite_file_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contract.sqlite3");

    {
        let repo = SqliteRepository::<Persona>::new(SqliteBackend::open(&path).unwrap());
        repo.create_table().await.unwrap();
        repo.save(Persona::new("Ana", "ana@example.com")).await.unwrap();
    }

    let repo = SqliteRepository::<Persona>::new(SqliteBackend::open(&path).unwrap());
    let all = repo.find_all(&ListQuery::new()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].nombre, "Ana");
}
