//! Terminal rendering for messages and product cards

use crate::api::{Message, ProductCard, Role};
use colored::Colorize;

/// Label shown before a message.
pub fn role_label(role: Role) -> colored::ColoredString {
    match role {
        Role::User => "you".cyan().bold(),
        Role::Ai => "fiend".magenta().bold(),
    }
}

/// Formats one product card as indented lines.
pub fn format_card(card: &ProductCard) -> String {
    let product = &card.product;
    let mut line = format!("  - {}", product.name.bold());
    if let Some(category) = &product.category {
        line.push_str(&format!(" [{}]", category));
    }
    if !product.url.is_empty() {
        line.push_str(&format!("\n      {}", product.url.underline()));
    }
    if let Some(image) = &card.preview_image {
        line.push_str(&format!("\n      image: {}", image.dimmed()));
    }
    line
}

/// Prints a message with its id and attached products.
pub fn print_message(message: &Message, cards: &[ProductCard]) {
    println!(
        "{} {}",
        role_label(message.role),
        format!("({})", message.id).dimmed()
    );
    println!("{}", message.content.text);
    for card in cards {
        println!("{}", format_card(card));
    }
    println!();
}
