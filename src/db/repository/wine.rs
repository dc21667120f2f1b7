//! Wine repository — plain functions over `&Connection`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::super::DatabaseError;
use crate::models::{Supermarket, Wine, WineType};

/// Optional filters for listing wines.
#[derive(Debug, Clone, Default)]
pub struct WineFilter {
    pub supermarket: Option<Supermarket>,
    pub wine_type: Option<WineType>,
    pub limit: u32,
}

const WINE_COLUMNS: &str = "id, name, supermarket, wine_type, rating, description,
     image_urls, influencer_source, post_url, date_found, in_stock, last_checked";

pub fn insert_wine(conn: &Connection, wine: &Wine) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO wines (id, name, supermarket, wine_type, rating, description,
         image_urls, influencer_source, post_url, date_found, in_stock, last_checked)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            wine.id.to_string(),
            wine.name,
            wine.supermarket.as_str(),
            wine.wine_type.as_str(),
            wine.rating,
            wine.description,
            serde_json::to_string(&wine.image_urls).unwrap_or_else(|_| "[]".into()),
            wine.influencer_source,
            wine.post_url,
            wine.date_found,
            wine.in_stock.map(|b| b as i32),
            wine.last_checked,
        ],
    )?;
    Ok(())
}

pub fn get_wine(conn: &Connection, id: &Uuid) -> Result<Option<Wine>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WINE_COLUMNS} FROM wines WHERE id = ?1"
    ))?;
    let row = stmt
        .query_row(params![id.to_string()], wine_from_row)
        .optional()?;
    row.transpose()
}

pub fn find_wine_by_post_url(
    conn: &Connection,
    post_url: &str,
) -> Result<Option<Wine>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WINE_COLUMNS} FROM wines WHERE post_url = ?1 LIMIT 1"
    ))?;
    let row = stmt.query_row(params![post_url], wine_from_row).optional()?;
    row.transpose()
}

/// List wines, newest first.
pub fn list_wines(conn: &Connection, filter: &WineFilter) -> Result<Vec<Wine>, DatabaseError> {
    let limit = if filter.limit == 0 { 100 } else { filter.limit };
    let mut sql = format!("SELECT {WINE_COLUMNS} FROM wines WHERE 1=1");
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![];

    if let Some(sm) = filter.supermarket {
        sql.push_str(" AND supermarket = ?");
        args.push(Box::new(sm.as_str().to_string()));
    }
    if let Some(wt) = filter.wine_type {
        sql.push_str(" AND wine_type = ?");
        args.push(Box::new(wt.as_str().to_string()));
    }
    sql.push_str(" ORDER BY date_found DESC LIMIT ?");
    args.push(Box::new(limit));

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();
    let rows = stmt.query_map(params.as_slice(), wine_from_row)?;

    let mut wines = Vec::new();
    for row in rows {
        wines.push(row??);
    }
    Ok(wines)
}

pub fn count_wines(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM wines", [], |row| row.get(0))?;
    Ok(count)
}

pub fn delete_wine(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute("DELETE FROM wines WHERE id = ?1", params![id.to_string()])?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "wine".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Allocate a disambiguated URL for the explicit duplicate-as-new
/// operation: `<url>#2`, `<url>#3`, ... — the first fragment not yet
/// present in the wines table.
pub fn allocate_duplicate_url(conn: &Connection, post_url: &str) -> Result<String, DatabaseError> {
    let base = post_url.split('#').next().unwrap_or(post_url);
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}#{n}");
        if find_wine_by_post_url(conn, &candidate)?.is_none() {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn wine_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Wine, DatabaseError>> {
    let id: String = row.get(0)?;
    let supermarket: String = row.get(2)?;
    let wine_type: String = row.get(3)?;
    let image_urls: String = row.get(6)?;

    Ok(build_wine(
        id,
        row.get(1)?,
        supermarket,
        wine_type,
        row.get(4)?,
        row.get(5)?,
        image_urls,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get::<_, Option<i32>>(10)?,
        row.get(11)?,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_wine(
    id: String,
    name: String,
    supermarket: String,
    wine_type: String,
    rating: Option<String>,
    description: Option<String>,
    image_urls: String,
    influencer_source: String,
    post_url: String,
    date_found: DateTime<Utc>,
    in_stock: Option<i32>,
    last_checked: Option<DateTime<Utc>>,
) -> Result<Wine, DatabaseError> {
    Ok(Wine {
        id: Uuid::parse_str(&id).map_err(|_| DatabaseError::InvalidEnum {
            field: "id".into(),
            value: id,
        })?,
        name,
        supermarket: Supermarket::parse(&supermarket).ok_or(DatabaseError::InvalidEnum {
            field: "supermarket".into(),
            value: supermarket,
        })?,
        wine_type: WineType::parse(&wine_type).ok_or(DatabaseError::InvalidEnum {
            field: "wine_type".into(),
            value: wine_type,
        })?,
        rating,
        description,
        image_urls: serde_json::from_str(&image_urls).map_err(|e| DatabaseError::InvalidJson {
            column: "image_urls".into(),
            reason: e.to_string(),
        })?,
        influencer_source,
        post_url,
        date_found,
        in_stock: in_stock.map(|v| v != 0),
        last_checked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn sample_wine(post_url: &str) -> Wine {
        Wine::new(
            "Campo Viejo Rioja Crianza".into(),
            Supermarket::AlbertHeijn,
            WineType::Red,
            Some("8/10".into()),
            Some("Soepele Spaanse rode".into()),
            vec!["https://cdn.example/w1_0.jpg".into()],
            "wijnkoningin_tiktok".into(),
            post_url.into(),
        )
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let conn = open_memory_database().unwrap();
        let wine = sample_wine("https://www.tiktok.com/@w/video/1");
        insert_wine(&conn, &wine).unwrap();

        let fetched = get_wine(&conn, &wine.id).unwrap().unwrap();
        assert_eq!(fetched.name, wine.name);
        assert_eq!(fetched.supermarket, Supermarket::AlbertHeijn);
        assert_eq!(fetched.image_urls, wine.image_urls);

        let by_url = find_wine_by_post_url(&conn, &wine.post_url).unwrap();
        assert!(by_url.is_some());
    }

    #[test]
    fn list_filters_by_supermarket_and_type() {
        let conn = open_memory_database().unwrap();
        let mut red = sample_wine("https://t/v/1");
        red.supermarket = Supermarket::Jumbo;
        insert_wine(&conn, &red).unwrap();

        let mut white = sample_wine("https://t/v/2");
        white.wine_type = WineType::White;
        insert_wine(&conn, &white).unwrap();

        let jumbo = list_wines(
            &conn,
            &WineFilter {
                supermarket: Some(Supermarket::Jumbo),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(jumbo.len(), 1);

        let whites = list_wines(
            &conn,
            &WineFilter {
                wine_type: Some(WineType::White),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(whites.len(), 1);
        assert_eq!(whites[0].post_url, "https://t/v/2");
    }

    #[test]
    fn delete_missing_wine_is_typed_not_found() {
        let conn = open_memory_database().unwrap();
        let err = delete_wine(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn allocate_duplicate_url_increments_fragment() {
        let conn = open_memory_database().unwrap();
        let base = "https://www.tiktok.com/@w/video/9";
        insert_wine(&conn, &sample_wine(base)).unwrap();

        let first = allocate_duplicate_url(&conn, base).unwrap();
        assert_eq!(first, format!("{base}#2"));

        insert_wine(&conn, &sample_wine(&first)).unwrap();
        let second = allocate_duplicate_url(&conn, base).unwrap();
        assert_eq!(second, format!("{base}#3"));

        // Allocating from an already-disambiguated URL reuses the base.
        let third = allocate_duplicate_url(&conn, &first).unwrap();
        assert_eq!(third, format!("{base}#3"));
    }
}
