#![allow(dead_code)]

/// Meal-Master, MasterCook, BigOven and RXF recipes in one mailbox dump,
/// with chatter between them.
pub const MIXED_MAILBOX: &str = r#"From: recipes-list@example.org
Subject: Soup swap

Here are this week's soups.

MMMMM----- Recipe via Meal-Master (tm) v8.05

      Title: Split Pea Soup
 Categories: Soup, Vegetarian
   Servings: 6

      1 lb dried split peas
      2 qt water
      1    onion; chopped

  Rinse the peas.

  Simmer everything for two hours.

MMMMM

Next one is from my MasterCook box.

                     *  Exported from  MasterCook  *

                              Pea Soup

Recipe By     : Joe Cook
Serving Size  : 4     Preparation Time :0:30
Categories    : Soups

  Amount  Measure       Ingredient -- Preparation Method
--------  ------------  --------------------------------
   1      cup           peas -- frozen
   2      cups          water

Boil the peas.

Serve hot.

                   - - - - - - - - - - - - - - - - - -

NOTES : Great soup.

----- Exported from BigOven -----

chicken tortilla soup
A quick weeknight soup.
Recipe By: Ana Lopez
Serving Size: 6
Cuisine: Mexican, Tex-Mex
Categories: Soup, Crockpot

Ingredients:
2 cups cooked chicken, shredded
1 can black beans
Instructions:
Combine everything in the pot.
----- End of BigOven Recipe -----

----- Begin Recipe (RXF) -----
Garden Pea Soup
Bright and quick.

2 | cups | peas | rinsed

Warm the peas through.
----- Recipe Data -----
Author: Joe Cook
Diet: Vegan
Notes: Serve with mint.
----- End Recipe (RXF) -----

Enjoy!
"#;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
