use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};

pub const DEFAULT_LIMIT: i64 = 25;

const LIST_SONGS_SELECT: &str = "SELECT songs.id, songs.name, songs.group_id \
     FROM songs \
     JOIN song_details ON songs.id = song_details.song_id";

/// Optional conjunctive filters for the song listing.
///
/// Substring filters (group, name, text) match case-insensitively;
/// release date and link must match exactly. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongFilter {
    pub group: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub text: Option<String>,
    pub link: Option<String>,
    /// 0 means "use the default page size"
    pub limit: i64,
    pub offset: i64,
}

impl SongFilter {
    pub fn effective_limit(&self) -> i64 {
        if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    /// Renders the listing query. Bind positions are assigned by the builder
    /// in the order predicates are pushed, so clause order never has to be
    /// kept in sync with placeholder numbers by hand.
    pub fn build_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(LIST_SONGS_SELECT);
        let mut has_where = false;
        let mut next_clause = |qb: &mut QueryBuilder<'static, Postgres>| {
            qb.push(if has_where { " AND " } else { " WHERE " });
            has_where = true;
        };

        if let Some(group) = non_empty(&self.group) {
            next_clause(&mut qb);
            qb.push("songs.group_id IN (SELECT id FROM groups WHERE name ILIKE ")
                .push_bind(contains_pattern(group))
                .push(")");
        }

        if let Some(name) = non_empty(&self.name) {
            next_clause(&mut qb);
            qb.push("songs.name ILIKE ").push_bind(contains_pattern(name));
        }

        if let Some(release_date) = self.release_date {
            next_clause(&mut qb);
            qb.push("song_details.release_date = ").push_bind(release_date);
        }

        if let Some(text) = non_empty(&self.text) {
            next_clause(&mut qb);
            qb.push("song_details.text ILIKE ").push_bind(contains_pattern(text));
        }

        if let Some(link) = non_empty(&self.link) {
            next_clause(&mut qb);
            qb.push("song_details.link = ").push_bind(link.to_string());
        }

        qb.push(" ORDER BY songs.name LIMIT ")
            .push_bind(self.effective_limit())
            .push(" OFFSET ")
            .push_bind(self.offset);

        qb
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// `%value%` with LIKE metacharacters escaped (Postgres' default escape is `\`)
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
