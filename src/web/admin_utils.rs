/// Compose a flash message HTML snippet for known admin status or error codes.
pub fn compose_flash_message(status: Option<&str>, error: Option<&str>) -> String {
    if let Some(status) = status {
        let message = match status {
            "category_created" => "Category created.",
            "category_deleted" => "Category deleted.",
            _ => "",
        };

        if !message.is_empty() {
            return format!(r#"<div class="flash success">{message}</div>"#);
        }
    }

    if let Some(error) = error {
        let message = match error {
            "missing_name" => "Please enter a category name.",
            "invalid_order" => "The position must be a whole number.",
            "invalid_id" => "That category reference is not valid.",
            "duplicate" => "A category with that name already exists.",
            "category_missing" => "That category no longer exists.",
            _ => "Something went wrong. Please try again.",
        };

        return format!(r#"<div class="flash error">{message}</div>"#);
    }

    String::new()
}
