//! A bank account guarded by contracts, with debug logging enabled

use anyhow::Result;
use dbc_contracts::{wrap, Class, ConstructorDef, FunctionDef, MethodDef, Value};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let account = Class::builder("Account")
        .doc(
            "A bank account.

            hinv: self.balance >= 0
            sinv: self.pending == 0",
        )
        .constructor(
            ConstructorDef::new(|this, args| {
                this.set("owner", args[0].clone())?;
                this.set("balance", 0)?;
                this.set("pending", 0)
            })
            .with_params(["owner"]),
        )
        .method(
            MethodDef::new("deposit", |this, args| {
                let amount = args[0].as_integer()?;
                this.set("pending", amount)?;
                let balance = this.attr("balance")?.as_integer()?;
                this.set("balance", balance + amount)?;
                this.set("pending", 0)?;
                this.attr("balance")
            })
            .with_params(["amount"])
            .with_doc(
                "pre: amount > 0
                post: __ret__ == __old__['self'].balance + amount",
            ),
        )
        .method(
            MethodDef::new("withdraw", |this, args| {
                let balance = this.attr("balance")?.as_integer()?;
                this.set("balance", balance - args[0].as_integer()?)?;
                this.attr("balance")
            })
            .with_params(["amount"])
            .with_doc("pre: amount > 0"),
        )
        .build()?;

    let alice = account.instantiate(vec![Value::from("alice")])?;
    println!("deposit 100 -> {}", alice.call("deposit", vec![Value::Integer(100)])?);
    println!("withdraw 30 -> {}", alice.call("withdraw", vec![Value::Integer(30)])?);

    match alice.call("withdraw", vec![Value::Integer(500)]) {
        Ok(balance) => println!("withdraw 500 -> {}", balance),
        Err(err) => println!("withdraw 500 rejected: {}", err),
    }
    match alice.call("deposit", vec![Value::Integer(-5)]) {
        Ok(balance) => println!("deposit -5 -> {}", balance),
        Err(err) => println!("deposit -5 rejected: {}", err),
    }
    println!("{:?}", alice);

    let interest = wrap(
        FunctionDef::new("interest", |args| {
            Ok(Value::Float(args[0].as_number()? * args[1].as_number()?))
        })
        .with_params(["balance", "rate"])
        .with_doc("pre: 0 <= rate <= 1\npost: __ret__ <= balance"),
    )?;
    println!("interest -> {}", interest.call(vec![Value::Integer(70), Value::Float(0.05)])?);
    if let Err(err) = interest.call(vec![Value::Integer(70), Value::Float(1.5)]) {
        println!("interest rejected: {}", err);
    }

    Ok(())
}
