// Jetporch
// Copyright (C) 2023 - Michael DeHaan <michael@michaeldehaan.net> + contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

pub fn markdown_print(markdown: &str) {
    termimad::print_text(markdown);
}

pub fn banner(msg: &str) {
    let markdown = format!("|:-|\n|{}|\n|-", escape_cell(msg));
    markdown_print(&markdown);
}

pub fn two_column_table(header_a: &str, header_b: &str, elements: &[(String, String)]) {
    markdown_print(&two_column_markdown(header_a, header_b, elements));
}

fn two_column_markdown(header_a: &str, header_b: &str, elements: &[(String, String)]) -> String {
    let mut buffer = String::from("|:-|:-\n");
    buffer.push_str(&format!("|{}|{}\n", escape_cell(header_a), escape_cell(header_b)));
    for (a, b) in elements.iter() {
        buffer.push_str("|-|-\n");
        buffer.push_str(&format!("|{}|{}\n", escape_cell(a), escape_cell(b)));
    }
    buffer.push_str("|-|-\n");
    buffer
}

// port lists and messages can carry pipes that would split a table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner() {
        // Just verify it doesn't panic
        banner("VALIDATING: roles_config.yml");
    }

    #[test]
    fn test_two_column_markdown() {
        let elements = vec![
            (String::from("roles_config.yml"), String::from("Failed")),
            (String::from("provision_config.yml"), String::from("Passed")),
        ];
        let table = two_column_markdown("File", "Status", &elements);
        assert!(table.starts_with("|:-|:-\n|File|Status\n"));
        assert!(table.contains("|roles_config.yml|Failed\n"));
        assert!(table.ends_with("|-|-\n"));
    }

    #[test]
    fn test_two_column_table_empty() {
        // Should handle empty tables gracefully
        two_column_table("File", "Status", &[]);
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b"), "a/b");
    }
}
