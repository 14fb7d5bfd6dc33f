use crate::app::AppState;
use crate::model::User;
use crate::ui::table::UserTable;

/// Users matching `query` (case-insensitive, on id, name or email), order kept.
pub fn filter_users(users: &[User], query: &str) -> Vec<User> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return users.to_vec();
    }
    users
        .iter()
        .filter(|u| {
            u.id.to_string().contains(&q)
                || u.name.to_lowercase().contains(&q)
                || u.email.to_lowercase().contains(&q)
        })
        .cloned()
        .collect()
}

/// Re-render the table from the last fetched list and the current query.
pub fn apply_search(app: &mut AppState) {
    let visible = filter_users(&app.users_all, &app.search_query);
    app.table = UserTable::render(&visible);
    app.selected_index = app
        .selected_index
        .min(app.table.rows().len().saturating_sub(1));
}
