//! Persistence Gateway — the durable mirror of the in-memory stores.
//!
//! DESIGN
//! ======
//! Every accepted mutation is written through as an upsert, spawned
//! fire-and-forget so websocket handling never blocks on Postgres I/O and a
//! slow write to one board cannot starve another board's room.
//!
//! ERROR HANDLING
//! ==============
//! A failed write is logged and in-memory state advances regardless; a
//! later reload simply reflects the last successfully persisted state. This
//! is the accepted durability gap — availability wins.

use canvas::{DraftStroke, Image, Item, ItemKind, Layer, Point, Snapshot, Stroke, Text};
use sqlx::{PgPool, Row};
use tracing::warn;

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Spawn a persistence write without awaiting it. Failures are logged and
/// never propagate to the caller.
pub fn spawn_write<F>(what: &'static str, fut: F)
where
    F: std::future::Future<Output = Result<(), sqlx::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            warn!(error = %e, what, "persistence write failed; in-memory state retained");
        }
    });
}

// =============================================================================
// BOARDS
// =============================================================================

/// Create a board row.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create_board(pool: &PgPool, board_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO boards (id, created_at) VALUES ($1, $2)")
        .bind(board_id)
        .bind(now_ms())
        .execute(pool)
        .await?;
    Ok(())
}

/// Whether a board id exists.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn board_exists(pool: &PgPool, board_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM boards WHERE id = $1)")
        .bind(board_id)
        .fetch_one(pool)
        .await
}

/// Fetch a board's title, if one was ever set.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn get_board_title(pool: &PgPool, board_id: &str) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("SELECT title FROM board_meta WHERE board_id = $1")
        .bind(board_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(|r| r.get::<Option<String>, _>("title")))
}

/// Upsert a board's title.
///
/// # Errors
///
/// Returns a database error if the upsert fails.
pub async fn set_board_title(pool: &PgPool, board_id: &str, title: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO board_meta (board_id, title) VALUES ($1, $2)
         ON CONFLICT (board_id) DO UPDATE SET title = EXCLUDED.title",
    )
    .bind(board_id)
    .bind(title)
    .execute(pool)
    .await?;
    Ok(())
}

// =============================================================================
// STATE LOAD
// =============================================================================

/// Load a board's full public state, ordered by rank within each kind.
///
/// # Errors
///
/// Returns a database error if any query fails.
pub async fn load_board_state(pool: &PgPool, board_id: &str) -> Result<Snapshot, sqlx::Error> {
    let title = get_board_title(pool, board_id).await?;

    let stroke_rows = sqlx::query_as::<
        _,
        (String, Option<String>, String, f64, serde_json::Value, String, i64, Option<String>),
    >(
        "SELECT id, created_by, color, size, points, layer, order_rank, group_id
         FROM strokes WHERE board_id = $1 ORDER BY order_rank ASC",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await?;

    let strokes = stroke_rows
        .into_iter()
        .map(|(id, user, color, size, points, layer, order, group_id)| Stroke {
            id,
            user,
            color,
            size,
            points: decode_points(&points),
            layer: Layer::parse(&layer),
            order,
            group_id,
        })
        .collect();

    let text_rows = sqlx::query_as::<
        _,
        (String, Option<String>, serde_json::Value, f64, f64, f64, String, String, i64, i64, Option<String>),
    >(
        "SELECT id, created_by, lines, x, y, font_size, color, layer, order_rank, created_at, label
         FROM texts WHERE board_id = $1 ORDER BY order_rank ASC",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await?;

    let texts = text_rows
        .into_iter()
        .map(
            |(id, user, lines, x, y, font_size, color, layer, order, created_at, label)| Text {
                id,
                user,
                lines: serde_json::from_value(lines).unwrap_or_default(),
                x,
                y,
                font_size,
                color,
                layer: Layer::parse(&layer),
                order,
                created_at,
                label: label.unwrap_or_default(),
            },
        )
        .collect();

    let image_rows = sqlx::query_as::<
        _,
        (String, Option<String>, String, f64, f64, f64, f64, String, i64),
    >(
        "SELECT id, created_by, src, x, y, width, height, layer, order_rank
         FROM images WHERE board_id = $1 ORDER BY order_rank ASC",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await?;

    let images = image_rows
        .into_iter()
        .map(|(id, user, src, x, y, width, height, layer, order)| Image {
            id,
            user,
            src,
            x,
            y,
            width,
            height,
            layer: Layer::parse(&layer),
            order,
        })
        .collect();

    Ok(Snapshot { title, strokes, texts, images })
}

fn decode_points(value: &serde_json::Value) -> Vec<Point> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

// =============================================================================
// ITEM WRITES
// =============================================================================

/// Upsert a stroke row.
///
/// # Errors
///
/// Returns a database error if the upsert fails.
pub async fn save_stroke(pool: &PgPool, board_id: &str, stroke: &Stroke) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO strokes (id, board_id, created_by, color, size, points, layer, order_rank, group_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (id) DO UPDATE SET
             color = EXCLUDED.color, size = EXCLUDED.size, points = EXCLUDED.points,
             layer = EXCLUDED.layer, order_rank = EXCLUDED.order_rank, group_id = EXCLUDED.group_id",
    )
    .bind(&stroke.id)
    .bind(board_id)
    .bind(&stroke.user)
    .bind(&stroke.color)
    .bind(stroke.size)
    .bind(serde_json::to_value(&stroke.points).unwrap_or_default())
    .bind(stroke.layer.as_str())
    .bind(stroke.order)
    .bind(&stroke.group_id)
    .bind(now_ms())
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a stroke row.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_stroke(pool: &PgPool, board_id: &str, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM strokes WHERE board_id = $1 AND id = $2")
        .bind(board_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Upsert a text row.
///
/// # Errors
///
/// Returns a database error if the upsert fails.
pub async fn save_text(pool: &PgPool, board_id: &str, text: &Text) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO texts (id, board_id, created_by, lines, x, y, font_size, color, layer, order_rank, created_at, label)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (id) DO UPDATE SET
             lines = EXCLUDED.lines, x = EXCLUDED.x, y = EXCLUDED.y,
             font_size = EXCLUDED.font_size, color = EXCLUDED.color, layer = EXCLUDED.layer,
             order_rank = EXCLUDED.order_rank, label = EXCLUDED.label",
    )
    .bind(&text.id)
    .bind(board_id)
    .bind(&text.user)
    .bind(serde_json::to_value(&text.lines).unwrap_or_default())
    .bind(text.x)
    .bind(text.y)
    .bind(text.font_size)
    .bind(&text.color)
    .bind(text.layer.as_str())
    .bind(text.order)
    .bind(text.created_at)
    .bind(&text.label)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a text row.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_text(pool: &PgPool, board_id: &str, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM texts WHERE board_id = $1 AND id = $2")
        .bind(board_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Upsert an image row.
///
/// # Errors
///
/// Returns a database error if the upsert fails.
pub async fn save_image(pool: &PgPool, board_id: &str, image: &Image) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO images (id, board_id, created_by, src, x, y, width, height, layer, order_rank, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (id) DO UPDATE SET
             src = EXCLUDED.src, x = EXCLUDED.x, y = EXCLUDED.y,
             width = EXCLUDED.width, height = EXCLUDED.height,
             layer = EXCLUDED.layer, order_rank = EXCLUDED.order_rank",
    )
    .bind(&image.id)
    .bind(board_id)
    .bind(&image.user)
    .bind(&image.src)
    .bind(image.x)
    .bind(image.y)
    .bind(image.width)
    .bind(image.height)
    .bind(image.layer.as_str())
    .bind(image.order)
    .bind(now_ms())
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete an image row.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_image(pool: &PgPool, board_id: &str, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM images WHERE board_id = $1 AND id = $2")
        .bind(board_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Persist any public item through the kind-appropriate upsert.
///
/// # Errors
///
/// Returns a database error if the upsert fails.
pub async fn save_item(pool: &PgPool, board_id: &str, item: &Item) -> Result<(), sqlx::Error> {
    match item {
        Item::Stroke(s) => save_stroke(pool, board_id, s).await,
        Item::Text(t) => save_text(pool, board_id, t).await,
        Item::Image(i) => save_image(pool, board_id, i).await,
    }
}

/// Delete any public item through the kind-appropriate statement.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_item(pool: &PgPool, board_id: &str, kind: ItemKind, id: &str) -> Result<(), sqlx::Error> {
    match kind {
        ItemKind::Stroke => delete_stroke(pool, board_id, id).await,
        ItemKind::Text => delete_text(pool, board_id, id).await,
        ItemKind::Image => delete_image(pool, board_id, id).await,
    }
}

// =============================================================================
// DRAFT WRITES
// =============================================================================

/// Upsert a draft-stroke row. Drafts live in their own table, additionally
/// keyed by owner.
///
/// # Errors
///
/// Returns a database error if the upsert fails.
pub async fn save_draft_stroke(
    pool: &PgPool,
    board_id: &str,
    draft: &DraftStroke,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO draft_strokes (id, board_id, created_by, color, size, points, order_rank, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO UPDATE SET
             color = EXCLUDED.color, size = EXCLUDED.size, points = EXCLUDED.points,
             order_rank = EXCLUDED.order_rank",
    )
    .bind(&draft.id)
    .bind(board_id)
    .bind(&draft.user)
    .bind(&draft.color)
    .bind(draft.size)
    .bind(serde_json::to_value(&draft.points).unwrap_or_default())
    .bind(draft.order)
    .bind(if draft.created_at == 0 { now_ms() } else { draft.created_at })
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a draft-stroke row, scoped by owner.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_draft_stroke(
    pool: &PgPool,
    board_id: &str,
    id: &str,
    user: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM draft_strokes WHERE board_id = $1 AND id = $2 AND created_by = $3")
        .bind(board_id)
        .bind(id)
        .bind(user)
        .execute(pool)
        .await?;
    Ok(())
}

/// List one owner's draft strokes for a board, ordered by rank.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_draft_strokes(
    pool: &PgPool,
    board_id: &str,
    user: &str,
) -> Result<Vec<DraftStroke>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String, f64, serde_json::Value, i64, i64)>(
        "SELECT id, color, size, points, order_rank, created_at
         FROM draft_strokes WHERE board_id = $1 AND created_by = $2 ORDER BY order_rank ASC",
    )
    .bind(board_id)
    .bind(user)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, color, size, points, order, created_at)| DraftStroke {
            id,
            user: user.to_owned(),
            color,
            size,
            points: decode_points(&points),
            order,
            created_at,
        })
        .collect())
}

// =============================================================================
// USERS
// =============================================================================

/// Record a display name, first write wins.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn register_user(pool: &PgPool, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}

/// Link a user to a board for the participants list.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn link_user_to_board(pool: &PgPool, board_id: &str, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO board_users (board_id, user_name) VALUES ($1, $2)
         ON CONFLICT (board_id, user_name) DO NOTHING",
    )
    .bind(board_id)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(())
}

/// List the display names ever seen on a board.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_board_users(pool: &PgPool, board_id: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT user_name FROM board_users WHERE board_id = $1 ORDER BY user_name ASC",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
