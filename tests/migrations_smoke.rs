use sqlx::Row;

fn database_url() -> String {
    dotenvy::dotenv().ok();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return url;
        }
    }

    let server = std::env::var("POSTGRES_SERVER").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "examhall".into());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    let db = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "examhall".into());

    format!("postgresql://{user}:{password}@{server}:{port}/{db}")
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url()).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    for table in ["users", "exams", "questions", "exam_sessions", "submissions"] {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    Ok(())
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn only_one_active_session_per_exam_and_student() -> anyhow::Result<()> {
    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url()).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let suffix = uuid::Uuid::new_v4().to_string();
    let user_id = format!("user-{suffix}");
    let exam_id = format!("exam-{suffix}");

    sqlx::query(
        "INSERT INTO users (id, email, hashed_password, role, created_at, updated_at)
         VALUES ($1, $2, 'x', 'student', NOW(), NOW())",
    )
    .bind(&user_id)
    .bind(format!("{suffix}@example.com"))
    .execute(&pool)
    .await?;
    sqlx::query(
        "INSERT INTO exams (id, name, start_time, end_time, duration_minutes, total_grade,
                            created_by, created_at, updated_at)
         VALUES ($1, 'Smoke', NOW(), NOW() + INTERVAL '1 hour', 30, 10, $2, NOW(), NOW())",
    )
    .bind(&exam_id)
    .bind(&user_id)
    .execute(&pool)
    .await?;

    let insert_session = |id: String| {
        sqlx::query(
            "INSERT INTO exam_sessions (id, exam_id, student_id, attempt_number, started_at,
                                        expires_at, created_at, updated_at)
             VALUES ($1, $2, $3, 1, NOW(), NOW() + INTERVAL '30 minutes', NOW(), NOW())",
        )
        .bind(id)
        .bind(exam_id.clone())
        .bind(user_id.clone())
    };

    insert_session(format!("s1-{suffix}")).execute(&pool).await?;
    let duplicate = insert_session(format!("s2-{suffix}")).execute(&pool).await;
    assert!(duplicate.is_err(), "second active session must violate the partial unique index");

    sqlx::query("DELETE FROM exams WHERE id = $1").bind(&exam_id).execute(&pool).await?;
    sqlx::query("DELETE FROM users WHERE id = $1").bind(&user_id).execute(&pool).await?;

    Ok(())
}
