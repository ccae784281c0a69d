//! CSV rendering of review records.

use crate::appstore::Review;

const HEADER: [&str; 6] = ["id", "title", "review", "rating", "date", "userName"];

/// Renders reviews as CSV with a header row. An empty list renders as "".
pub fn reviews_to_csv(reviews: &[Review]) -> String {
    if reviews.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    push_row(&mut out, HEADER.iter().copied());
    for review in reviews {
        let rating = review.rating.to_string();
        push_row(
            &mut out,
            [
                review.id.as_str(),
                review.title.as_str(),
                review.body.as_str(),
                rating.as_str(),
                review.date.as_str(),
                review.author.as_str(),
            ],
        );
    }
    out
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_empty_string() {
        assert_eq!(reviews_to_csv(&[]), "");
    }

    #[test]
    fn renders_header_and_rows() {
        let reviews = vec![
            Review {
                id: "1".to_string(),
                title: "Nice".to_string(),
                body: "Works well".to_string(),
                rating: 5,
                date: "2024-05-01T10:00:00-07:00".to_string(),
                author: "sam".to_string(),
            },
            Review {
                id: "2".to_string(),
                title: "Meh, ok".to_string(),
                body: "He said \"fine\"\nthen left".to_string(),
                rating: 3,
                date: String::new(),
                author: "kim".to_string(),
            },
        ];

        let csv = reviews_to_csv(&reviews);
        let expected = "id,title,review,rating,date,userName\n\
                        1,Nice,Works well,5,2024-05-01T10:00:00-07:00,sam\n\
                        2,\"Meh, ok\",\"He said \"\"fine\"\"\nthen left\",3,,kim\n";
        assert_eq!(csv, expected);
    }
}
