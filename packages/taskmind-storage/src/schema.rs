pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_todos.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_todos.sql")),
				"tables/002_todo_embeddings.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_todo_embeddings.sql")),
				"tables/003_ai_chat_history.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_ai_chat_history.sql")),
				"functions/010_match_todos.sql" =>
					out.push_str(include_str!("../../../sql/functions/010_match_todos.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expands_every_include_and_dimension() {
		let sql = render_schema(1_536);

		assert!(!sql.contains("\\ir "));
		assert!(!sql.contains("<VECTOR_DIM>"));
		assert!(sql.contains("embedding vector(1536) NULL"));
		assert!(sql.contains("CREATE OR REPLACE FUNCTION match_todos("));
	}

	#[test]
	fn function_body_survives_statement_split() {
		let sql = render_schema(8);
		let function = sql
			.split(';')
			.find(|statement| statement.contains("FUNCTION match_todos"))
			.expect("match_todos statement");

		assert!(function.trim_end().ends_with("$$"));
	}
}
