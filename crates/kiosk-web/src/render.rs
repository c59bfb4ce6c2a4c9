//! Server-side HTML for the dashboard page.

use crate::view::{AccessView, STATUS_ALLOWED};
use std::fmt::Write;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn access_page(rows: &[AccessView]) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>Sistema de Accesos</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<h1>Registro de Accesos</h1>
<table>
<thead>
<tr><th>ID</th><th>Nombre</th><th>ID Persona</th><th>Fecha y hora</th><th>Estado</th><th>Imagen</th></tr>
</thead>
<tbody>
"#,
    );

    if rows.is_empty() {
        html.push_str("<tr><td colspan=\"6\">Sin registros</td></tr>\n");
    }

    for row in rows {
        let class = if row.estado == STATUS_ALLOWED { "permitido" } else { "denegado" };
        let image = match &row.imagen {
            Some(url) => format!(
                "<img src=\"{}\" alt=\"{}\" width=\"96\">",
                escape_html(url),
                escape_html(&row.nombre)
            ),
            None => "-".to_string(),
        };
        // Writing to a String cannot fail.
        let _ = writeln!(
            html,
            "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{image}</td></tr>",
            row.id,
            escape_html(&row.nombre),
            escape_html(&row.persona_id),
            escape_html(&row.when.display()),
            escape_html(row.estado),
        );
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_store::AccessEvent;

    fn view(name: &str, person_id: Option<&str>, path: Option<&str>) -> AccessView {
        AccessEvent {
            id: 1,
            name: name.into(),
            person_id: person_id.map(String::from),
            timestamp: "2024-03-05 14:07:09.000001".into(),
            face_image_path: path.map(String::from),
        }
        .into()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<b>"A&B's"</b>"#), "&lt;b&gt;&quot;A&amp;B&#39;s&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_page_rows() {
        let html = access_page(&[
            view("Carlos", Some("Carlos"), Some("/x/y/z/Carlos_ab12cd34.jpg")),
            view("unknown", None, None),
        ]);
        assert!(html.contains("src=\"/faces/Carlos_ab12cd34.jpg\""));
        assert!(!html.contains("/x/y/z"));
        assert!(html.contains("05/03/2024 14:07:09"));
        assert!(html.contains("<td>Permitido</td>"));
        assert!(html.contains("<td>No autorizado</td>"));
        assert!(html.contains("<td>No identificado</td>"));
    }

    #[test]
    fn test_page_escapes_names() {
        let html = access_page(&[view("<script>alert(1)</script>", Some("7"), None)]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_empty_page() {
        assert!(access_page(&[]).contains("Sin registros"));
    }
}
