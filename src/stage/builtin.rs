use serde::{Deserialize, Serialize};

use crate::error::ScrublineError;

use super::{Rule, Stage};

/// The closed set of built-in stages, in no particular order. The canonical
/// traversal order lives in [`default_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    Trim,
    OsCommand,
    Sql,
    Html,
    Php,
    Js,
    Python,
    Vb,
    Ruby,
    Lua,
    Xss,
    Template,
    Traversal,
}

/// The fixed default traversal order. Order matters under first-match mode:
/// an earlier stage that changes the string preempts every later one.
pub fn default_order() -> [StageId; 13] {
    [
        StageId::Trim,
        StageId::OsCommand,
        StageId::Sql,
        StageId::Html,
        StageId::Php,
        StageId::Js,
        StageId::Python,
        StageId::Vb,
        StageId::Ruby,
        StageId::Lua,
        StageId::Xss,
        StageId::Template,
        StageId::Traversal,
    ]
}

impl StageId {
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Trim => "trim",
            StageId::OsCommand => "os-command",
            StageId::Sql => "sql",
            StageId::Html => "html",
            StageId::Php => "php",
            StageId::Js => "js",
            StageId::Python => "python",
            StageId::Vb => "vb",
            StageId::Ruby => "ruby",
            StageId::Lua => "lua",
            StageId::Xss => "xss",
            StageId::Template => "template",
            StageId::Traversal => "traversal",
        }
    }

    /// Build the stage carrying this id's rule table.
    pub fn build(&self) -> Stage {
        match self {
            StageId::Trim => trim(),
            StageId::OsCommand => os_command(),
            StageId::Sql => sql(),
            StageId::Html => html(),
            StageId::Php => php(),
            StageId::Js => js(),
            StageId::Python => python(),
            StageId::Vb => vb(),
            StageId::Ruby => ruby(),
            StageId::Lua => lua(),
            StageId::Xss => xss(),
            StageId::Template => template(),
            StageId::Traversal => traversal(),
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StageId {
    type Err = ScrublineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trim" => Ok(StageId::Trim),
            "os-command" => Ok(StageId::OsCommand),
            "sql" => Ok(StageId::Sql),
            "html" => Ok(StageId::Html),
            "php" => Ok(StageId::Php),
            "js" => Ok(StageId::Js),
            "python" => Ok(StageId::Python),
            "vb" => Ok(StageId::Vb),
            "ruby" => Ok(StageId::Ruby),
            "lua" => Ok(StageId::Lua),
            "xss" => Ok(StageId::Xss),
            "template" => Ok(StageId::Template),
            "traversal" => Ok(StageId::Traversal),
            _ => Err(ScrublineError::UnknownStage { name: s.into() }),
        }
    }
}

fn stage(id: StageId, message: &str, rules: Vec<Rule>) -> Stage {
    Stage::new(id.name(), message, rules).expect("built-in stage rules compile")
}

fn pattern(pat: &str, replace: &str) -> Rule {
    Rule::pattern(pat, replace).expect("built-in pattern compiles")
}

fn trim() -> Stage {
    stage(StageId::Trim, "Trim applied.", vec![Rule::Trim])
}

/// Backslash-escapes shell metacharacters.
fn os_command() -> Stage {
    stage(
        StageId::OsCommand,
        "OS Injection prevention applied.",
        vec![
            Rule::literal("&", "\\&"),
            Rule::literal("|", "\\|"),
            Rule::literal(";", "\\;"),
            Rule::literal("`", "\\`"),
            Rule::literal("$", "\\$"),
            Rule::literal(">", "\\>"),
            Rule::literal("<", "\\<"),
            Rule::literal("*", "\\*"),
            Rule::literal("?", "\\?"),
            Rule::literal("!", "\\!"),
            Rule::literal("~", "\\~"),
        ],
    )
}

/// SQL metacharacter escaping. The backslash-doubling rule runs after the
/// `;` and `--` rules, so the backslashes those rules introduce come out
/// doubled (`;` becomes `\\;`). Sequential application is the contract.
fn sql() -> Stage {
    stage(
        StageId::Sql,
        "SQL Injection prevention applied.",
        vec![
            Rule::literal("'", "''"),
            Rule::literal(";", "\\;"),
            Rule::literal("--", "\\--"),
            Rule::literal("\\", "\\\\"),
            Rule::literal("\u{0}", "\\x00"),
            Rule::literal("\u{1a}", "\\x1a"),
            Rule::literal("\"", "\\\""),
            Rule::literal("%", "\\%"),
        ],
    )
}

/// HTML entity escaping. The `&` rule runs first, so entities introduced by
/// later rules keep their ampersands unescaped.
fn html() -> Stage {
    stage(
        StageId::Html,
        "HTML escape applied.",
        vec![
            Rule::literal("&", "&amp;"),
            Rule::literal("<", "&lt;"),
            Rule::literal(">", "&gt;"),
            Rule::literal("\"", "&quot;"),
            Rule::literal("'", "&#039;"),
            Rule::literal("`", "&#x60;"),
            Rule::literal("/", "&#x2F;"),
            Rule::literal("=", "&#x3D;"),
        ],
    )
}

fn php() -> Stage {
    stage(
        StageId::Php,
        "PHP Injection prevention applied.",
        vec![
            pattern(r"(?i)<\?(php)?", "&lt;?php"),
            Rule::literal("?>", "?&gt;"),
        ],
    )
}

fn js() -> Stage {
    stage(
        StageId::Js,
        "JavaScript Injection prevention applied.",
        vec![
            pattern("(?i)<script", "&lt;script"),
            Rule::literal("</script>", "&lt;/script&gt;"),
            Rule::literal("javascript:", "javascript&#58;"),
            Rule::literal("eval(", "eval&#40;"),
            Rule::literal("new Function", "new&#32;Function"),
            Rule::literal("alert(", "alert&#40;"),
            Rule::literal("console.", "console&#46;"),
        ],
    )
}

fn python() -> Stage {
    stage(
        StageId::Python,
        "Python Injection prevention applied.",
        vec![
            pattern("(?i)import ", "import&#32;"),
            Rule::literal("exec(", "exec&#40;"),
            Rule::literal("eval(", "eval&#40;"),
            Rule::literal("os.", "os&#46;"),
            Rule::literal("sys.", "sys&#46;"),
            Rule::literal("subprocess.", "subprocess&#46;"),
        ],
    )
}

/// Only the `CreateObject` rule is case-insensitive; the rest are exact
/// literals.
fn vb() -> Stage {
    stage(
        StageId::Vb,
        "VB Injection prevention applied.",
        vec![
            pattern("(?i)CreateObject", "Create&#79;bject"),
            Rule::literal("GetObject", "Get&#79;bject"),
            Rule::literal("Execute", "Exec&#117;te"),
            Rule::literal("Eval", "Ev&#97;l"),
            Rule::literal("WScript.Shell", "WScript&#46;Shell"),
        ],
    )
}

fn ruby() -> Stage {
    stage(
        StageId::Ruby,
        "Ruby Injection prevention applied.",
        vec![
            Rule::literal("`", "\\`"),
            Rule::literal("$", "\\$"),
            Rule::literal("%x(", "%x\\("),
            Rule::literal("system(", "system\\("),
            Rule::literal("exec(", "exec\\("),
            Rule::literal("open(", "open\\("),
        ],
    )
}

fn lua() -> Stage {
    stage(
        StageId::Lua,
        "Lua Injection prevention applied.",
        vec![
            pattern(r"(?i)os\.execute", "os&#46;execute"),
            Rule::literal("io.popen", "io&#46;popen"),
            Rule::literal("loadstring", "loadstring&#40;"),
            Rule::literal("dofile", "dofile&#40;"),
            Rule::literal("loadfile", "loadfile&#40;"),
        ],
    )
}

fn xss() -> Stage {
    stage(
        StageId::Xss,
        "XSS prevention applied.",
        vec![
            pattern("(?i)<script", "&lt;script"),
            Rule::literal("</script>", "&lt;/script&gt;"),
            Rule::literal("onerror=", "onerror&#61;"),
            Rule::literal("onload=", "onload&#61;"),
            Rule::literal("javascript:", "javascript&#58;"),
        ],
    )
}

fn template() -> Stage {
    stage(
        StageId::Template,
        "Template Injection prevention applied.",
        vec![
            Rule::literal("{{", "{&#123;"),
            Rule::literal("}}", "}&#125;"),
        ],
    )
}

/// Two passes in a fixed order: pattern-strip `../` then `..`, then the same
/// pair as literals. The pattern pass already removes everything the literal
/// pass could match; the second pass stays because the output of the fixed
/// sequence is the pinned contract (see the `....//` test).
fn traversal() -> Stage {
    stage(
        StageId::Traversal,
        "Directory Traversal prevention applied.",
        vec![
            pattern(r"\.\./", ""),
            pattern(r"\.\.", ""),
            Rule::literal("../", ""),
            Rule::literal("..", ""),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(id: StageId, input: &str) -> String {
        id.build().apply(input).0
    }

    #[test]
    fn os_command_escapes_each_metacharacter() {
        assert_eq!(apply(StageId::OsCommand, "ls | rm"), "ls \\| rm");
        assert_eq!(apply(StageId::OsCommand, "a;b"), "a\\;b");
        assert_eq!(apply(StageId::OsCommand, "$HOME"), "\\$HOME");
        assert_eq!(apply(StageId::OsCommand, "x > y < z"), "x \\> y \\< z");
        assert_eq!(apply(StageId::OsCommand, "*.txt?"), "\\*.txt\\?");
    }

    #[test]
    fn sql_doubles_quotes_and_backslashes() {
        assert_eq!(apply(StageId::Sql, "it's"), "it''s");
        // `;` becomes `\;` and the later backslash rule doubles it.
        assert_eq!(apply(StageId::Sql, "a;b"), "a\\\\;b");
        assert_eq!(apply(StageId::Sql, "DROP--"), "DROP\\\\--");
        // `%` is rewritten after the backslash rule, so it stays single.
        assert_eq!(apply(StageId::Sql, "100%"), "100\\%");
        assert_eq!(apply(StageId::Sql, "say \"hi\""), "say \\\"hi\\\"");
        // NUL is rewritten after the backslash rule, so its escape stays
        // single.
        assert_eq!(apply(StageId::Sql, "a\u{0}b"), "a\\x00b");
    }

    #[test]
    fn html_escapes_in_table_order() {
        assert_eq!(apply(StageId::Html, "a < b"), "a &lt; b");
        assert_eq!(apply(StageId::Html, "x=1"), "x&#x3D;1");
        assert_eq!(apply(StageId::Html, "path/to"), "path&#x2F;to");
        // The `&` rule runs first; ampersands introduced by later rules stay.
        assert_eq!(apply(StageId::Html, "it's"), "it&#039;s");
        assert_eq!(apply(StageId::Html, "&lt;"), "&amp;lt;");
    }

    #[test]
    fn php_neutralizes_open_and_close_tags() {
        assert_eq!(apply(StageId::Php, "<?php echo 1 ?>"), "&lt;?php echo 1 ?&gt;");
        // Short open tag gains the full `php` spelling, matching the pattern
        // replacement.
        assert_eq!(apply(StageId::Php, "<? echo"), "&lt;?php echo");
        assert_eq!(apply(StageId::Php, "<?PHP x"), "&lt;?php x");
    }

    #[test]
    fn js_neutralizes_script_and_calls() {
        // The pattern's replacement is fixed text, so the matched case is
        // not preserved.
        assert_eq!(
            apply(StageId::Js, "<SCRIPT>alert(1)</script>"),
            "&lt;script>alert&#40;1)&lt;/script&gt;"
        );
        assert_eq!(
            apply(StageId::Js, "javascript:eval(x)"),
            "javascript&#58;eval&#40;x)"
        );
        assert_eq!(apply(StageId::Js, "new Function"), "new&#32;Function");
        assert_eq!(apply(StageId::Js, "console.log"), "console&#46;log");
    }

    #[test]
    fn python_neutralizes_imports_and_modules() {
        assert_eq!(apply(StageId::Python, "import os"), "import&#32;os");
        assert_eq!(apply(StageId::Python, "IMPORT sys"), "import&#32;sys");
        assert_eq!(
            apply(StageId::Python, "subprocess.run(cmd)"),
            "subprocess&#46;run(cmd)"
        );
        assert_eq!(apply(StageId::Python, "os.system"), "os&#46;system");
    }

    #[test]
    fn vb_create_object_any_case_rest_exact() {
        assert_eq!(apply(StageId::Vb, "CREATEOBJECT(x)"), "Create&#79;bject(x)");
        assert_eq!(apply(StageId::Vb, "Execute cmd"), "Exec&#117;te cmd");
        // Lowercase `execute` is not a literal match.
        assert_eq!(apply(StageId::Vb, "execute cmd"), "execute cmd");
        assert_eq!(
            apply(StageId::Vb, "WScript.Shell"),
            "WScript&#46;Shell"
        );
    }

    #[test]
    fn ruby_escapes_shellouts() {
        assert_eq!(apply(StageId::Ruby, "`ls`"), "\\`ls\\`");
        assert_eq!(apply(StageId::Ruby, "system(whoami)"), "system\\(whoami)");
        assert_eq!(apply(StageId::Ruby, "%x(date)"), "%x\\(date)");
        assert_eq!(apply(StageId::Ruby, "$0"), "\\$0");
    }

    #[test]
    fn lua_neutralizes_exec_primitives() {
        assert_eq!(apply(StageId::Lua, "OS.EXECUTE(c)"), "os&#46;execute(c)");
        assert_eq!(apply(StageId::Lua, "io.popen(c)"), "io&#46;popen(c)");
        assert_eq!(apply(StageId::Lua, "dofile"), "dofile&#40;");
        assert_eq!(apply(StageId::Lua, "loadstring"), "loadstring&#40;");
    }

    #[test]
    fn xss_neutralizes_handlers() {
        assert_eq!(
            apply(StageId::Xss, "<img onerror=alert(1)>"),
            "<img onerror&#61;alert(1)>"
        );
        assert_eq!(apply(StageId::Xss, "<body onload=go()>"), "<body onload&#61;go()>");
        assert_eq!(apply(StageId::Xss, "<Script>"), "&lt;script>");
    }

    #[test]
    fn template_escapes_double_braces() {
        assert_eq!(apply(StageId::Template, "{{name}}"), "{&#123;name}&#125;");
        // A single brace is untouched.
        assert_eq!(apply(StageId::Template, "{name}"), "{name}");
    }

    #[test]
    fn traversal_strips_dotdot_sequences() {
        assert_eq!(apply(StageId::Traversal, "../etc/passwd"), "etc/passwd");
        assert_eq!(apply(StageId::Traversal, "..\\win"), "\\win");
        assert_eq!(apply(StageId::Traversal, "a..b../c"), "abc");
    }

    #[test]
    fn traversal_four_dot_double_slash_bypass() {
        // `....//`: the `../` pattern matches at offset 2 leaving `../`, the
        // `..` pattern then strips the leading dots. The residue is a bare
        // slash with no `..` left.
        assert_eq!(apply(StageId::Traversal, "....//"), "/");
    }

    #[test]
    fn every_stage_passes_empty_input_through() {
        for id in default_order() {
            let (out, changed) = id.build().apply("");
            assert_eq!(out, "", "stage {id} altered empty input");
            assert!(!changed, "stage {id} reported a change on empty input");
        }
    }

    #[test]
    fn stage_names_round_trip() {
        for id in default_order() {
            let parsed: StageId = id.name().parse().unwrap();
            assert_eq!(parsed, id);
        }
        assert!("bogus".parse::<StageId>().is_err());
    }
}
