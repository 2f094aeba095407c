use alert_caster::traits::KeyValueStore;
use alert_caster::types::Result;
use alert_caster::PgStore;

#[tokio::test]
#[ignore = "needs a PostgreSQL instance in DATABASE_URL"]
async fn test_pg_store_upsert_and_remove() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return Ok(());
    };
    let store = PgStore::connect(&database_url).await?;
    let key = format!("rss_cache_test_{}", uuid::Uuid::new_v4());

    assert_eq!(store.get(&key).await?, None);

    store.set(&key, "first").await?;
    store.set(&key, "second").await?;
    assert_eq!(store.get(&key).await?.as_deref(), Some("second"));

    store.remove(&key).await?;
    assert_eq!(store.get(&key).await?, None);

    Ok(())
}
