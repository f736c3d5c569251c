//! Demonstration of a Store driven by combined todo and goal reducers

use reflux::{combine_reducers, Store, StoreConfig};

#[derive(Clone, Debug)]
struct Todo {
    id: usize,
    name: String,
    complete: bool,
}

#[derive(Clone, Debug)]
struct Goal {
    id: usize,
    name: String,
}

#[derive(Clone, Debug)]
enum Action {
    AddTodo(Todo),
    RemoveTodo(usize),
    ToggleTodo(usize),
    AddGoal(Goal),
    RemoveGoal(usize),
}

#[derive(Clone, Debug)]
struct AppState {
    todos: Vec<Todo>,
    goals: Vec<Goal>,
}

impl AppState {
    fn stats(&self) -> (usize, usize, usize) {
        let total = self.todos.len();
        let completed = self.todos.iter().filter(|t| t.complete).count();
        (total, total - completed, completed)
    }
}

fn todos(state: &Vec<Todo>, action: &Action) -> Vec<Todo> {
    let mut next = state.clone();
    match action {
        Action::AddTodo(todo) => next.push(todo.clone()),
        Action::RemoveTodo(id) => next.retain(|todo| todo.id != *id),
        Action::ToggleTodo(id) => {
            if let Some(todo) = next.iter_mut().find(|todo| todo.id == *id) {
                todo.complete = !todo.complete;
            }
        }
        _ => {}
    }
    next
}

fn goals(state: &Vec<Goal>, action: &Action) -> Vec<Goal> {
    let mut next = state.clone();
    match action {
        Action::AddGoal(goal) => next.push(goal.clone()),
        Action::RemoveGoal(id) => next.retain(|goal| goal.id != *id),
        _ => {}
    }
    next
}

fn todo(id: usize, name: &str, complete: bool) -> Todo {
    Todo {
        id,
        name: name.to_string(),
        complete,
    }
}

fn goal(id: usize, name: &str) -> Goal {
    Goal {
        id,
        name: name.to_string(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Store Example: Todos and Goals ===\n");

    // Create store from the combined reducer
    let store = Store::with_config(
        combine_reducers!(AppState, Action => {
            todos: todos,
            goals: goals,
        }),
        StoreConfig::new().with_name("todos-demo"),
    );

    println!("1. Setting up subscriber");
    let subscription = store.subscribe({
        let store = store.clone();
        move || {
            let state = store.get_state();
            let (total, active, completed) = state.stats();
            println!(
                "   [Store Update] Todos: {} ({} active, {} completed), Goals: {}",
                total,
                active,
                completed,
                state.goals.len()
            );
        }
    });

    println!("\n2. Adding todos");
    store.dispatch(Action::AddTodo(todo(0, "Learn Redux", false)))?;
    store.dispatch(Action::AddTodo(todo(1, "Wash the car", false)))?;
    store.dispatch(Action::AddTodo(todo(2, "Go to the gym", true)))?;

    println!("\n3. Removing and toggling");
    store.dispatch(Action::RemoveTodo(1))?;
    store.dispatch(Action::ToggleTodo(0))?;

    println!("\n4. Current todos:");
    store.with_state(|state| {
        for todo in &state.todos {
            let status = if todo.complete { "✓" } else { " " };
            println!("   [{}] {}", status, todo.name);
        }
    });

    println!("\n5. Adding and removing goals");
    store.dispatch(Action::AddGoal(goal(0, "Learn Redux")))?;
    store.dispatch(Action::AddGoal(goal(1, "Lose 20 pounds")))?;
    store.dispatch(Action::RemoveGoal(0))?;

    println!("\n6. Current goals:");
    store.with_state(|state| {
        for goal in &state.goals {
            println!("   - {}", goal.name);
        }
    });

    println!("\n7. Unsubscribing; further updates are silent");
    subscription.unsubscribe();
    store.dispatch(Action::ToggleTodo(2))?;

    let (total, active, completed) = store.with_state(AppState::stats);
    println!("\n8. Final statistics:");
    println!("   Total: {}", total);
    println!("   Active: {}", active);
    println!("   Completed: {}", completed);
    println!("   Dispatches: {}", store.dispatch_count());

    println!("\n✓ Example complete!");
    Ok(())
}
