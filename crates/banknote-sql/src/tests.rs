use crate::*;

#[test]
fn test_validate_ident() {
    assert_eq!(validate_ident("variance"), Ok("variance"));
    assert_eq!(validate_ident("_tmp$1"), Ok("_tmp$1"));
    assert_eq!(validate_ident("public.original_data"), Ok("public.original_data"));

    assert_eq!(validate_ident(""), Err(IdentError::Empty));
    assert!(matches!(
        validate_ident("1col"),
        Err(IdentError::BadStart { .. })
    ));
    assert!(matches!(
        validate_ident("a.b.c"),
        Err(IdentError::BadChar { ch: '.', .. })
    ));
    assert!(matches!(
        validate_ident("trailing."),
        Err(IdentError::BadStart { .. })
    ));
    assert!(matches!(
        validate_ident("name; DROP TABLE x"),
        Err(IdentError::BadChar { ch: ';', .. })
    ));
    assert!(matches!(
        validate_ident("col\"quoted"),
        Err(IdentError::BadChar { ch: '"', .. })
    ));
}

#[test]
fn test_value_literals() {
    assert_eq!(Value::Null.to_sql_literal(), "NULL");
    assert_eq!(Value::Integer(-3).to_sql_literal(), "-3");
    assert_eq!(Value::Float(3.5).to_sql_literal(), "3.5");
    assert_eq!(Value::Float(f64::NAN).to_sql_literal(), "NULL");
    assert_eq!(Value::from("O'Brien").to_sql_literal(), "'O''Brien'");
    assert_eq!(Value::from(None::<i64>), Value::Null);
}

#[test]
fn test_value_conversions() {
    assert_eq!(Value::Text(" 4.25 ".into()).as_f64(), Some(4.25));
    assert_eq!(Value::Float(2.0).as_i64(), Some(2));
    assert_eq!(Value::Float(2.5).as_i64(), None);
    assert_eq!(Value::Text("abc".into()).as_f64(), None);
    assert_eq!(Value::Null.as_i64(), None);
}

#[test]
fn test_insert_multi_row() {
    let stmt = InsertStmt::new("bank_note_pred")
        .columns(["variance", "prediction"])
        .row([Value::Float(3.6216), Value::Integer(0)])
        .row([Value::Float(-1.5), Value::Null]);

    let sql = stmt.render().unwrap().unwrap();
    insta::assert_snapshot!(sql, @"INSERT INTO bank_note_pred (variance, prediction) VALUES (3.6216, 0), (-1.5, NULL)");
}

#[test]
fn test_insert_row_arity() {
    let short = InsertStmt::new("bank_note_pred")
        .columns(["variance", "prediction"])
        .row([Value::Float(1.0), Value::Integer(0)])
        .row([Value::Float(-1.5)]);
    assert_eq!(
        short.render(),
        Err(StmtError::RowArity {
            row: 1,
            expected: 2,
            got: 1
        })
    );

    let long = InsertStmt::new("bank_note_pred")
        .columns(["variance"])
        .row([Value::Float(1.0), Value::Integer(0)]);
    assert!(matches!(
        long.render(),
        Err(StmtError::RowArity { got: 2, .. })
    ));
}

#[test]
fn test_insert_without_rows() {
    let stmt = InsertStmt::new("bank_note_pred").columns(["variance"]);
    assert_eq!(stmt.render().unwrap(), None);
}

#[test]
fn test_insert_rejects_bad_column() {
    let stmt = InsertStmt::new("t")
        .columns(["ok", "not ok"])
        .row([Value::Integer(1), Value::Integer(2)]);
    assert!(matches!(
        stmt.render(),
        Err(StmtError::Ident(IdentError::BadChar { ch: ' ', .. }))
    ));
}

#[test]
fn test_update_with_where() {
    let stmt = UpdateStmt::new("original_data")
        .set("class", 1)
        .set("note", "it's fine")
        .and_where(Condition::eq("uniq_key", "abc"))
        .and_where(Condition::eq("entropy", None::<f64>));

    let sql = stmt.render().unwrap().unwrap();
    insta::assert_snapshot!(sql, @"UPDATE original_data SET class = 1, note = 'it''s fine' WHERE uniq_key = 'abc' AND entropy IS NULL");
}

#[test]
fn test_update_nothing_to_set() {
    assert_eq!(UpdateStmt::new("t").render().unwrap(), None);
}

#[test]
fn test_delete() {
    let all = DeleteStmt::new("bank_note_pred").render().unwrap();
    assert_eq!(all, "DELETE FROM bank_note_pred");

    let some = DeleteStmt::new("bank_note_pred")
        .and_where(Condition::eq("prediction", 1))
        .render()
        .unwrap();
    insta::assert_snapshot!(some, @"DELETE FROM bank_note_pred WHERE prediction = 1");
}
