//! Session credential storage.
//!
//! The stored set mirrors the browser's cookie jar after the last login
//! attempt. It is only ever replaced as a whole.

use crate::error::{DatabaseError, Result};
use scout_core::{Credential, SameSite};
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;

/// Replace the stored credential set with `credentials`.
///
/// Deletes every stored credential and inserts the new set. Entries sharing a
/// `(name, domain, path)` key collapse to the last one. Run this inside a
/// transaction so readers never observe a partially replaced set.
pub async fn replace_all(conn: &mut SqliteConnection, credentials: &[Credential]) -> Result<()> {
    let mut unique: HashMap<(&str, &str, &str), &Credential> = HashMap::new();
    let mut order = Vec::new();
    for credential in credentials {
        let key = (
            credential.name.as_str(),
            credential.domain.as_deref().unwrap_or(""),
            credential.path.as_deref().unwrap_or(""),
        );
        if unique.insert(key, credential).is_none() {
            order.push(key);
        }
    }

    sqlx::query("DELETE FROM credentials")
        .execute(&mut *conn)
        .await?;

    for key in &order {
        let credential = unique[key];
        sqlx::query(
            r"
            INSERT INTO credentials
                (name, value, domain, path, expires_at, http_only, secure, same_site, partition_key)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&credential.name)
        .bind(&credential.value)
        .bind(&credential.domain)
        .bind(&credential.path)
        .bind(credential.expires_at)
        .bind(credential.http_only)
        .bind(credential.secure)
        .bind(credential.same_site.map(|s| s.as_str()))
        .bind(&credential.partition_key)
        .execute(&mut *conn)
        .await?;
    }

    tracing::debug!("Stored {} credentials", order.len());
    Ok(())
}

/// Fetch every stored credential.
pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Credential>> {
    let rows = sqlx::query(
        r"
        SELECT name, value, domain, path, expires_at, http_only, secure, same_site, partition_key
        FROM credentials
        ORDER BY rowid
        ",
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|row| -> Result<Credential> {
            let same_site = row
                .try_get::<Option<String>, _>("same_site")?
                .map(|s| {
                    s.parse::<SameSite>()
                        .map_err(|e| DatabaseError::Decode(e.to_string()))
                })
                .transpose()?;

            Ok(Credential {
                name: row.try_get("name")?,
                value: row.try_get("value")?,
                domain: row.try_get("domain")?,
                path: row.try_get("path")?,
                expires_at: row.try_get("expires_at")?,
                http_only: row.try_get("http_only")?,
                secure: row.try_get("secure")?,
                same_site,
                partition_key: row.try_get("partition_key")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_db;

    fn session_cookie() -> Credential {
        Credential {
            name: "wt2".to_string(),
            value: "secret-token".to_string(),
            domain: Some(".zhipin.com".to_string()),
            path: Some("/".to_string()),
            expires_at: Some(1_893_456_000.5),
            http_only: Some(true),
            secure: Some(true),
            same_site: Some(SameSite::Lax),
            partition_key: None,
        }
    }

    #[tokio::test]
    async fn test_replace_and_fetch_round_trip() {
        let db = create_test_db().await;
        let cookies = vec![
            session_cookie(),
            Credential::new("lastCity", "101020100").scoped(".zhipin.com", "/"),
            Credential::new("bare", "value"),
        ];

        let mut tx = db.begin().await.expect("begin");
        replace_all(&mut tx, &cookies).await.expect("replace");
        tx.commit().await.expect("commit");

        let mut conn = db.pool().acquire().await.expect("acquire connection");
        let stored = fetch_all(&mut conn).await.expect("fetch");
        assert_eq!(stored, cookies);
    }

    #[tokio::test]
    async fn test_replace_discards_previous_set() {
        let db = create_test_db().await;

        let mut tx = db.begin().await.expect("begin");
        replace_all(&mut tx, &[session_cookie()])
            .await
            .expect("first replace");
        tx.commit().await.expect("commit");

        let replacement = vec![Credential::new("other", "1").scoped(".zhipin.com", "/")];
        let mut tx = db.begin().await.expect("begin");
        replace_all(&mut tx, &replacement)
            .await
            .expect("second replace");
        tx.commit().await.expect("commit");

        let mut conn = db.pool().acquire().await.expect("acquire connection");
        assert_eq!(fetch_all(&mut conn).await.expect("fetch"), replacement);
    }

    #[tokio::test]
    async fn test_duplicate_keys_collapse_to_last() {
        let db = create_test_db().await;
        let mut newer = session_cookie();
        newer.value = "rotated".to_string();

        let mut tx = db.begin().await.expect("begin");
        replace_all(&mut tx, &[session_cookie(), newer.clone()])
            .await
            .expect("replace");
        tx.commit().await.expect("commit");

        let mut conn = db.pool().acquire().await.expect("acquire connection");
        assert_eq!(fetch_all(&mut conn).await.expect("fetch"), vec![newer]);
    }

    #[tokio::test]
    async fn test_empty_set_clears_store() {
        let db = create_test_db().await;

        let mut tx = db.begin().await.expect("begin");
        replace_all(&mut tx, &[session_cookie()])
            .await
            .expect("replace");
        replace_all(&mut tx, &[]).await.expect("clear");
        tx.commit().await.expect("commit");

        let mut conn = db.pool().acquire().await.expect("acquire connection");
        assert!(fetch_all(&mut conn).await.expect("fetch").is_empty());
    }
}
